//! Per-run state: output directory, credential store, login sessions, and
//! staged files awaiting their final name.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{CredentialStore, SessionAuthState};
use crate::download::filename::resolve_unique_path;
use crate::download::{Transport, strip_page_prefix};
use crate::parser::Selection;

const WRITE_CHECK_NAME: &str = ".harvester-write-check";

/// Fatal setup errors, raised before any page is processed.
#[derive(Debug, Error)]
pub enum RunError {
    /// The output directory cannot be created or written.
    #[error("output directory {path} is not usable: {source}")]
    OutputDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// What happens when two downloads end up with the same final filename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// The later file replaces the earlier one (logged at warn level).
    #[default]
    Overwrite,
    /// The later file gets a numeric suffix (`name_2.ext`, ...).
    Suffix,
}

impl CollisionPolicy {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::Suffix => "suffix",
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "suffix" => Ok(Self::Suffix),
            other => Err(format!(
                "unknown collision policy '{other}' (expected 'overwrite' or 'suffix')"
            )),
        }
    }
}

/// Everything a run mutates, owned in one place.
///
/// Dropping the context finalizes staged files and forgets session
/// credentials, login state and the attached transport's cookies, so cleanup
/// happens even when a run is abandoned midway.
pub struct RunContext {
    output_dir: PathBuf,
    selection: Selection,
    collision: CollisionPolicy,
    credentials: Option<CredentialStore>,
    sessions: HashMap<String, SessionAuthState>,
    staged: Vec<PathBuf>,
    transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("output_dir", &self.output_dir)
            .field("selection", &self.selection)
            .field("collision", &self.collision)
            .field("credentials", &self.credentials)
            .field("sessions", &self.sessions)
            .field("staged", &self.staged)
            .field("transport_attached", &self.transport.is_some())
            .finish()
    }
}

impl RunContext {
    /// Prepares `output_dir` (created if missing) and checks it is writable.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::OutputDir`] if the directory cannot be created or
    /// written to.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, RunError> {
        let output_dir = output_dir.into();
        let to_error = |source| RunError::OutputDir {
            path: output_dir.clone(),
            source,
        };
        fs::create_dir_all(&output_dir).map_err(to_error)?;
        let check_file = output_dir.join(WRITE_CHECK_NAME);
        fs::write(&check_file, b"").map_err(to_error)?;
        let _ = fs::remove_file(&check_file);
        debug!(path = %output_dir.display(), "output directory ready");

        Ok(Self {
            output_dir,
            selection: Selection::All,
            collision: CollisionPolicy::default(),
            credentials: None,
            sessions: HashMap::new(),
            staged: Vec::new(),
            transport: None,
        })
    }

    /// Restricts downloads to `selection`.
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the filename collision policy.
    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision = policy;
        self
    }

    /// Attaches the credential store used for pages that require login.
    #[must_use]
    pub fn with_credential_store(mut self, store: CredentialStore) -> Self {
        self.credentials = Some(store);
        self
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Extension selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Collision policy.
    #[must_use]
    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision
    }

    /// Credential store, if one is attached.
    pub fn credentials_mut(&mut self) -> Option<&mut CredentialStore> {
        self.credentials.as_mut()
    }

    /// Login state for `domain` established earlier in this run.
    #[must_use]
    pub fn session(&self, domain: &str) -> Option<&SessionAuthState> {
        self.sessions.get(domain)
    }

    /// Records the login state for its domain.
    pub fn store_session(&mut self, state: SessionAuthState) {
        self.sessions.insert(state.domain().to_string(), state);
    }

    /// Registers the transport whose cookies belong to this run.
    ///
    /// [`clear_session`](Self::clear_session) resets its cookie jar.
    pub fn attach_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = Some(transport);
    }

    /// Path a staged file should be written to.
    ///
    /// Under [`CollisionPolicy::Suffix`] an existing file is never reused.
    #[must_use]
    pub fn staging_path(&self, staged_name: &str) -> PathBuf {
        match self.collision {
            CollisionPolicy::Overwrite => self.output_dir.join(staged_name),
            CollisionPolicy::Suffix => resolve_unique_path(&self.output_dir, staged_name),
        }
    }

    /// Remembers a successfully written staged file.
    pub fn record_staged(&mut self, path: PathBuf) {
        if !self.staged.contains(&path) {
            self.staged.push(path);
        }
    }

    /// Staged files not yet finalized.
    #[must_use]
    pub fn staged(&self) -> &[PathBuf] {
        &self.staged
    }

    /// Renames staged files to their final names, in staging order.
    ///
    /// Returns the final paths. Files that cannot be renamed keep their
    /// staged name and are logged.
    pub fn finalize(&mut self) -> Vec<PathBuf> {
        let staged = std::mem::take(&mut self.staged);
        let mut finalized = Vec::with_capacity(staged.len());

        for staged_path in staged {
            let Some(final_name) = staged_path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(strip_page_prefix)
                .map(str::to_string)
            else {
                finalized.push(staged_path);
                continue;
            };

            let target = match self.collision {
                CollisionPolicy::Overwrite => {
                    let target = self.output_dir.join(&final_name);
                    if target.exists() {
                        warn!(path = %target.display(), "overwriting existing file");
                    }
                    target
                }
                CollisionPolicy::Suffix => resolve_unique_path(&self.output_dir, &final_name),
            };

            match fs::rename(&staged_path, &target) {
                Ok(()) => {
                    debug!(from = %staged_path.display(), to = %target.display(), "file finalized");
                    finalized.push(target);
                }
                Err(e) => {
                    warn!(path = %staged_path.display(), error = %e, "could not finalize file");
                    finalized.push(staged_path);
                }
            }
        }

        if !finalized.is_empty() {
            info!(count = finalized.len(), "staged files finalized");
        }
        finalized
    }

    /// Forgets session credentials, login state and session cookies.
    pub fn clear_session(&mut self) {
        if let Some(store) = self.credentials.as_mut() {
            store.clear_session();
        }
        self.sessions.clear();
        if let Some(transport) = self.transport.take() {
            transport.reset_cookies();
            debug!("session cookies cleared");
        }
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            self.finalize();
        }
        self.clear_session();
    }
}
