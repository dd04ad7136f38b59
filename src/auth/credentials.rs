//! Per-domain credential store with a run-scoped session cache.
//!
//! Credentials persist in a plain-text file, one record per line:
//!
//! ```text
//! # domain|username|password|description
//! forum.example.com|alice|hunter2|main account
//! ```
//!
//! Lines starting with `#` are comments and survive rewrites; blank lines are
//! ignored and malformed lines are skipped with a warning. Fields split on the
//! first three `|`, so only the description may itself contain `|`. Saving
//! rejects `|` in the other fields and line breaks anywhere.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::prompt::CredentialPrompt;

/// Prompt attempts before an empty username/password is rejected.
pub const MAX_PROMPT_ATTEMPTS: usize = 3;

const FIELD_SEPARATOR: char = '|';

/// Errors raised while resolving or persisting credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading or rewriting the credential file failed.
    #[error("credential file error at {path}: {source}")]
    Io {
        /// Path of the credential file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A field is empty or contains characters the file format cannot hold.
    #[error("invalid credentials for {domain}: {reason}")]
    Validation {
        /// Domain the credentials were for.
        domain: String,
        /// What was wrong.
        reason: String,
    },

    /// Credentials are needed but nobody can be asked.
    #[error(
        "credentials required for {domain} but no interactive prompt is available\n  Suggestion: save credentials for {domain} in the credential file or pass --username/--password"
    )]
    PromptUnavailable {
        /// Domain that needed credentials.
        domain: String,
    },

    /// The interactive prompt itself failed (closed stdin, terminal error).
    #[error("credential prompt failed for {domain}: {source}")]
    Prompt {
        /// Domain being prompted for.
        domain: String,
        /// Underlying terminal error.
        #[source]
        source: io::Error,
    },
}

impl CredentialError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn validation(domain: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            domain: domain.to_string(),
            reason: reason.into(),
        }
    }
}

/// A username/password pair.
///
/// The password is redacted in Debug output to prevent accidental logging.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Builds credentials, rejecting an empty username or password.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Validation`] when either field is empty.
    pub fn new(
        domain: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let username = username.into().trim().to_string();
        let password = password.into();
        if username.is_empty() {
            return Err(CredentialError::validation(domain, "username is empty"));
        }
        if password.is_empty() {
            return Err(CredentialError::validation(domain, "password is empty"));
        }
        check_field(domain, "username", &username, true)?;
        check_field(domain, "password", &password, true)?;
        Ok(Self { username, password })
    }

    /// Builds credentials whose fields the caller already validated.
    pub(crate) fn new_unchecked(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    ///
    /// Passwords are sensitive, avoid logging the return value.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One persisted credential line.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Exact, case-sensitive domain key.
    pub domain: String,
    /// Free-form note.
    pub description: String,
    credentials: Credentials,
}

impl CredentialRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        credentials: Credentials,
        description: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            description: description.into(),
            credentials,
        }
    }

    /// The stored username/password pair.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn to_line(&self) -> String {
        format!(
            "{domain}{sep}{user}{sep}{pass}{sep}{desc}",
            domain = self.domain,
            user = self.credentials.username,
            pass = self.credentials.password,
            desc = self.description,
            sep = FIELD_SEPARATOR,
        )
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("domain", &self.domain)
            .field("username", &self.credentials.username)
            .field("password", &"[REDACTED]")
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FileLine {
    Comment(String),
    Record(CredentialRecord),
}

/// In-memory image of the credential file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialFile {
    lines: Vec<FileLine>,
}

impl CredentialFile {
    /// Parses file contents, skipping malformed lines.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();
        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if line.trim_start().starts_with('#') {
                lines.push(FileLine::Comment(line.to_string()));
                continue;
            }
            match parse_record(line) {
                Some(record) => lines.push(FileLine::Record(record)),
                None => warn!(line = index + 1, "skipping malformed credential line"),
            }
        }
        Self { lines }
    }

    /// Reads `path`; a missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] when the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CredentialError::io(path, e)),
        }
    }

    /// Exact, case-sensitive lookup by domain.
    #[must_use]
    pub fn lookup(&self, domain: &str) -> Option<&CredentialRecord> {
        self.records().find(|record| record.domain == domain)
    }

    /// Iterates over stored records in file order.
    pub fn records(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.lines.iter().filter_map(|line| match line {
            FileLine::Record(record) => Some(record),
            FileLine::Comment(_) => None,
        })
    }

    /// Replaces any record for the same domain with `record`, appended last.
    pub fn upsert(&mut self, record: CredentialRecord) {
        self.lines.retain(
            |line| !matches!(line, FileLine::Record(existing) if existing.domain == record.domain),
        );
        self.lines.push(FileLine::Record(record));
    }

    /// Serializes back to the line format.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                FileLine::Comment(comment) => out.push_str(comment),
                FileLine::Record(record) => out.push_str(&record.to_line()),
            }
            out.push('\n');
        }
        out
    }

    /// Atomically rewrites `path` (temp sibling, then rename).
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] when any filesystem step fails.
    pub fn write(&self, path: &Path) -> Result<(), CredentialError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CredentialError::io(parent, e))?;
        }
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, self.render()).map_err(|e| CredentialError::io(&tmp_path, e))?;
        set_owner_only_permissions(&tmp_path).map_err(|e| CredentialError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CredentialError::io(path, e)
        })
    }
}

/// Rejects characters that would break the one-record-per-line format.
///
/// Line breaks are never allowed; `|` only in the trailing description.
fn check_field(
    domain: &str,
    name: &str,
    value: &str,
    reject_separator: bool,
) -> Result<(), CredentialError> {
    if value.contains(['\r', '\n']) {
        return Err(CredentialError::validation(
            domain,
            format!("{name} contains a line break"),
        ));
    }
    if reject_separator && value.contains(FIELD_SEPARATOR) {
        return Err(CredentialError::validation(
            domain,
            format!("{name} contains '{FIELD_SEPARATOR}'"),
        ));
    }
    Ok(())
}

fn parse_record(line: &str) -> Option<CredentialRecord> {
    let mut fields = line.splitn(4, FIELD_SEPARATOR);
    let domain = fields.next()?.trim();
    let username = fields.next()?.trim();
    let password = fields.next()?;
    let description = fields.next().unwrap_or_default().trim();
    if domain.is_empty() || username.is_empty() || password.is_empty() {
        return None;
    }
    Some(CredentialRecord::new(
        domain,
        Credentials::new_unchecked(username, password),
        description,
    ))
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// How credentials are obtained when the session cache has none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialMode {
    /// Always prompt; persist only if the user agrees.
    Manual,
    /// Use the credential file, prompting (cache only) on a miss.
    #[default]
    Saved,
}

impl CredentialMode {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Saved => "saved",
        }
    }
}

impl fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "saved" => Ok(Self::Saved),
            other => Err(format!(
                "unknown credential mode '{other}' (expected 'manual' or 'saved')"
            )),
        }
    }
}

/// Credential lookup, persistence, and prompting for one run.
pub struct CredentialStore {
    path: PathBuf,
    mode: CredentialMode,
    session: HashMap<String, Credentials>,
    prompt: Box<dyn CredentialPrompt + Send>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("cached_domains", &self.session.len())
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Opens the store backed by `path`.
    ///
    /// With `required`, the file must exist and be readable; otherwise a
    /// missing file behaves as an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] if the file cannot be read.
    #[instrument(level = "debug", skip(path, prompt), fields(path = %path.as_ref().display()))]
    pub fn open(
        path: impl AsRef<Path>,
        required: bool,
        mode: CredentialMode,
        prompt: Box<dyn CredentialPrompt + Send>,
    ) -> Result<Self, CredentialError> {
        let path = path.as_ref().to_path_buf();
        if required {
            fs::read_to_string(&path).map_err(|e| CredentialError::io(&path, e))?;
        } else {
            // Surface permission problems now rather than mid-run.
            CredentialFile::load(&path)?;
        }
        Ok(Self {
            path,
            mode,
            session: HashMap::new(),
            prompt,
        })
    }

    /// Path of the durable credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Active resolution mode.
    #[must_use]
    pub fn mode(&self) -> CredentialMode {
        self.mode
    }

    /// Session cache first, then the durable file.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] if the file cannot be read.
    pub fn lookup(&self, domain: &str) -> Result<Option<Credentials>, CredentialError> {
        if let Some(cached) = self.session.get(domain) {
            return Ok(Some(cached.clone()));
        }
        let file = CredentialFile::load(&self.path)?;
        Ok(file.lookup(domain).map(|record| record.credentials().clone()))
    }

    /// Persists credentials for `domain` (replacing any previous record) and
    /// caches them for the run.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Validation`] for empty fields, or
    /// [`CredentialError::Io`] if the file cannot be rewritten.
    #[instrument(skip(self, username, password, description))]
    pub fn save(
        &mut self,
        domain: &str,
        username: &str,
        password: &str,
        description: &str,
    ) -> Result<(), CredentialError> {
        let credentials = Credentials::new(domain, username, password)?;
        if domain.trim().is_empty() {
            return Err(CredentialError::validation(domain, "domain is empty"));
        }
        check_field(domain, "domain", domain, true)?;
        check_field(domain, "description", description, false)?;
        let mut file = CredentialFile::load(&self.path)?;
        file.upsert(CredentialRecord::new(domain, credentials.clone(), description));
        file.write(&self.path)?;
        info!(domain, "credentials saved");
        self.cache(domain, credentials);
        Ok(())
    }

    /// Caches `credentials` for `domain` until [`clear_session`](Self::clear_session).
    pub fn cache(&mut self, domain: &str, credentials: Credentials) {
        self.session.insert(domain.to_string(), credentials);
    }

    /// Returns credentials for `domain` according to the active mode.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Validation`] after repeated empty input,
    /// [`CredentialError::PromptUnavailable`] when prompting is impossible,
    /// and I/O errors from the durable file.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub fn resolve(&mut self, domain: &str) -> Result<Credentials, CredentialError> {
        if let Some(cached) = self.session.get(domain) {
            debug!(domain, "using session-cached credentials");
            return Ok(cached.clone());
        }

        match self.mode {
            CredentialMode::Manual => {
                let credentials = self.prompt_validated(domain)?;
                let wants_save = self
                    .prompt
                    .confirm_save(domain)
                    .map_err(|source| CredentialError::Prompt {
                        domain: domain.to_string(),
                        source,
                    })?;
                if wants_save {
                    self.save(
                        domain,
                        credentials.username(),
                        credentials.password(),
                        "",
                    )?;
                } else {
                    self.cache(domain, credentials.clone());
                }
                Ok(credentials)
            }
            CredentialMode::Saved => {
                let file = CredentialFile::load(&self.path)?;
                if let Some(record) = file.lookup(domain) {
                    debug!(domain, "using saved credentials");
                    let credentials = record.credentials().clone();
                    self.cache(domain, credentials.clone());
                    return Ok(credentials);
                }
                info!(domain, "no saved credentials, prompting");
                let credentials = self.prompt_validated(domain)?;
                self.cache(domain, credentials.clone());
                Ok(credentials)
            }
        }
    }

    /// Forgets every session-cached credential.
    pub fn clear_session(&mut self) {
        if !self.session.is_empty() {
            debug!(count = self.session.len(), "clearing session credentials");
        }
        self.session.clear();
    }

    /// Number of domains currently cached.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.session.len()
    }

    fn prompt_validated(&mut self, domain: &str) -> Result<Credentials, CredentialError> {
        if !self.prompt.is_interactive() {
            return Err(CredentialError::PromptUnavailable {
                domain: domain.to_string(),
            });
        }

        let mut last_error = None;
        for attempt in 1..=MAX_PROMPT_ATTEMPTS {
            let (username, password) =
                self.prompt
                    .ask_credentials(domain)
                    .map_err(|source| CredentialError::Prompt {
                        domain: domain.to_string(),
                        source,
                    })?;
            match Credentials::new(domain, username, password) {
                Ok(credentials) => return Ok(credentials),
                Err(e) => {
                    warn!(domain, attempt, error = %e, "rejected credential input");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| CredentialError::validation(domain, "no credentials entered")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::prompt::NoPrompt;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Prompt that replays scripted answers and records calls.
    #[derive(Default)]
    struct ScriptedPrompt {
        answers: VecDeque<(String, String)>,
        save: bool,
        asked: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedPrompt {
        fn new(answers: &[(&str, &str)], save: bool) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(u, p)| ((*u).to_string(), (*p).to_string()))
                    .collect(),
                save,
                asked: Arc::default(),
            }
        }
    }

    impl CredentialPrompt for ScriptedPrompt {
        fn ask_credentials(&mut self, domain: &str) -> io::Result<(String, String)> {
            self.asked.lock().unwrap().push(domain.to_string());
            self.answers
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }

        fn confirm_save(&mut self, _domain: &str) -> io::Result<bool> {
            Ok(self.save)
        }
    }

    fn store_with(dir: &TempDir, mode: CredentialMode, prompt: ScriptedPrompt) -> CredentialStore {
        CredentialStore::open(dir.path().join("credentials.txt"), false, mode, Box::new(prompt))
            .unwrap()
    }

    #[test]
    fn test_parse_skips_malformed_and_keeps_comments() {
        let file = CredentialFile::parse(
            "# header\n\nforum.example.com|alice|pw|main\nbroken-line\n|nouser|pw|\nsite.org|bob|p|w|d|x\n",
        );
        let records: Vec<_> = file.records().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].domain, "forum.example.com");
        assert_eq!(records[1].credentials().password(), "p");
        assert_eq!(records[1].description, "w|d|x");
        assert!(file.render().starts_with("# header\n"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let file = CredentialFile::parse("Forum.example.com|alice|pw|\n");
        assert!(file.lookup("forum.example.com").is_none());
        assert!(file.lookup("Forum.example.com").is_some());
    }

    #[test]
    fn test_save_then_lookup_returns_same_pair() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, CredentialMode::Saved, ScriptedPrompt::default());
        store.save("forum.example.com", "alice", "hunter2", "main").unwrap();
        store.clear_session();

        let found = store.lookup("forum.example.com").unwrap().unwrap();
        assert_eq!(found.username(), "alice");
        assert_eq!(found.password(), "hunter2");
    }

    #[test]
    fn test_double_save_keeps_one_record_with_latest_values() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, CredentialMode::Saved, ScriptedPrompt::default());
        store.save("forum.example.com", "alice", "old", "").unwrap();
        store.save("forum.example.com", "alice2", "new", "").unwrap();

        let file = CredentialFile::load(store.path()).unwrap();
        let records: Vec<_> = file.records().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].credentials().username(), "alice2");
        assert_eq!(records[0].credentials().password(), "new");
    }

    #[test]
    fn test_save_preserves_comments_and_other_domains() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.txt");
        fs::write(&path, "# mine\nsite.org|bob|pw|\n").unwrap();
        let mut store = CredentialStore::open(
            &path,
            true,
            CredentialMode::Saved,
            Box::new(ScriptedPrompt::default()),
        )
        .unwrap();
        store.save("forum.example.com", "alice", "pw2", "new").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "# mine\nsite.org|bob|pw|\nforum.example.com|alice|pw2|new\n"
        );
        assert!(!dir.path().join("credentials.txt.tmp").exists());
    }

    #[test]
    fn test_save_rejects_empty_fields() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, CredentialMode::Saved, ScriptedPrompt::default());
        let result = store.save("forum.example.com", "", "pw", "");
        assert!(matches!(result, Err(CredentialError::Validation { .. })));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_rejects_separator_in_password() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, CredentialMode::Saved, ScriptedPrompt::default());
        let result = store.save("forum.example.com", "alice", "p|w", "desc");
        assert!(matches!(result, Err(CredentialError::Validation { .. })));
        assert!(!store.path().exists());
        assert!(store.lookup("forum.example.com").unwrap().is_none());
    }

    #[test]
    fn test_save_rejects_line_break_in_description() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, CredentialMode::Saved, ScriptedPrompt::default());
        let result = store.save(
            "a.example.com",
            "bob",
            "x",
            "note\nevil.example.com|mallory|pw|",
        );
        assert!(matches!(result, Err(CredentialError::Validation { .. })));
        store.clear_session();
        assert!(store.lookup("evil.example.com").unwrap().is_none());
        assert!(store.lookup("a.example.com").unwrap().is_none());
    }

    #[test]
    fn test_save_rejects_separator_in_domain_and_username() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, CredentialMode::Saved, ScriptedPrompt::default());
        assert!(store.save("a|b.example.com", "bob", "x", "").is_err());
        assert!(store.save("forum.example.com", "bo\rb", "x", "").is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_description_may_contain_separator() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, CredentialMode::Saved, ScriptedPrompt::default());
        store
            .save("forum.example.com", "alice", "hunter2", "main | backup")
            .unwrap();
        store.clear_session();

        let file = CredentialFile::load(store.path()).unwrap();
        let record = file.lookup("forum.example.com").unwrap();
        assert_eq!(record.description, "main | backup");
        assert_eq!(record.credentials().password(), "hunter2");
    }

    #[test]
    fn test_open_required_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = CredentialStore::open(
            dir.path().join("absent.txt"),
            true,
            CredentialMode::Saved,
            Box::new(NoPrompt),
        );
        assert!(matches!(result, Err(CredentialError::Io { .. })));
    }

    #[test]
    fn test_saved_mode_uses_file_without_prompting() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("credentials.txt"),
            "forum.example.com|alice|pw|\n",
        )
        .unwrap();
        let prompt = ScriptedPrompt::default();
        let asked = Arc::clone(&prompt.asked);
        let mut store = store_with(&dir, CredentialMode::Saved, prompt);

        let creds = store.resolve("forum.example.com").unwrap();
        assert_eq!(creds.username(), "alice");
        assert!(asked.lock().unwrap().is_empty());
        assert_eq!(store.cached_count(), 1);
    }

    #[test]
    fn test_saved_mode_miss_prompts_and_caches_without_persisting() {
        let dir = TempDir::new().unwrap();
        let prompt = ScriptedPrompt::new(&[("carol", "secret")], true);
        let asked = Arc::clone(&prompt.asked);
        let mut store = store_with(&dir, CredentialMode::Saved, prompt);

        let creds = store.resolve("forum.example.com").unwrap();
        assert_eq!(creds.username(), "carol");
        // Second resolve hits the session cache.
        store.resolve("forum.example.com").unwrap();
        assert_eq!(asked.lock().unwrap().len(), 1);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_manual_mode_always_prompts_and_persists_when_confirmed() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("credentials.txt"),
            "forum.example.com|alice|old|\n",
        )
        .unwrap();
        let prompt = ScriptedPrompt::new(&[("dave", "fresh")], true);
        let asked = Arc::clone(&prompt.asked);
        let mut store = store_with(&dir, CredentialMode::Manual, prompt);

        let creds = store.resolve("forum.example.com").unwrap();
        assert_eq!(creds.username(), "dave");
        assert_eq!(asked.lock().unwrap().len(), 1);

        let file = CredentialFile::load(store.path()).unwrap();
        let saved = file.lookup("forum.example.com").unwrap();
        assert_eq!(saved.credentials().password(), "fresh");
    }

    #[test]
    fn test_manual_mode_declined_save_only_caches() {
        let dir = TempDir::new().unwrap();
        let prompt = ScriptedPrompt::new(&[("dave", "fresh")], false);
        let mut store = store_with(&dir, CredentialMode::Manual, prompt);

        store.resolve("forum.example.com").unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.cached_count(), 1);
    }

    #[test]
    fn test_empty_input_reprompts_then_fails() {
        let dir = TempDir::new().unwrap();
        let prompt = ScriptedPrompt::new(&[("", "pw"), ("bob", ""), (" ", "pw")], false);
        let mut store = store_with(&dir, CredentialMode::Saved, prompt);
        let result = store.resolve("forum.example.com");
        assert!(matches!(result, Err(CredentialError::Validation { .. })));
    }

    #[test]
    fn test_empty_input_then_valid_input_succeeds() {
        let dir = TempDir::new().unwrap();
        let prompt = ScriptedPrompt::new(&[("", ""), ("bob", "pw")], false);
        let mut store = store_with(&dir, CredentialMode::Saved, prompt);
        assert_eq!(store.resolve("forum.example.com").unwrap().username(), "bob");
    }

    #[test]
    fn test_no_prompt_yields_prompt_unavailable() {
        let dir = TempDir::new().unwrap();
        let mut store = CredentialStore::open(
            dir.path().join("credentials.txt"),
            false,
            CredentialMode::Saved,
            Box::new(NoPrompt),
        )
        .unwrap();
        let result = store.resolve("forum.example.com");
        assert!(matches!(
            result,
            Err(CredentialError::PromptUnavailable { .. })
        ));
    }

    #[test]
    fn test_clear_session_forgets_cached_credentials() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, CredentialMode::Saved, ScriptedPrompt::default());
        store.cache("forum.example.com", Credentials::new_unchecked("a", "b"));
        assert!(store.lookup("forum.example.com").unwrap().is_some());
        store.clear_session();
        assert!(store.lookup("forum.example.com").unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new_unchecked("alice", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
        let record = CredentialRecord::new("d", creds, "");
        assert!(!format!("{record:?}").contains("hunter2"));
    }

    #[test]
    fn test_credential_mode_from_str() {
        assert_eq!("Manual".parse::<CredentialMode>().unwrap(), CredentialMode::Manual);
        assert_eq!("saved".parse::<CredentialMode>().unwrap(), CredentialMode::Saved);
        assert!("auto".parse::<CredentialMode>().is_err());
    }
}
