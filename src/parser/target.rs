//! Page targets submitted for scraping.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use super::error::{MAX_URL_LENGTH, ParseError};
use crate::auth::Credentials;

/// Accepted page URL shape: an http(s) scheme followed by non-whitespace.
#[allow(clippy::expect_used)]
static PAGE_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("page URL regex is valid")); // Static pattern, safe to panic

/// A page queued for processing, optionally carrying login credentials.
///
/// Targets are validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    url: String,
    domain: String,
    origin: String,
    credentials: Option<Credentials>,
    requires_auth: bool,
}

impl PageTarget {
    /// Creates a target for a public page.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the URL is not `http(s)://` followed by
    /// non-whitespace, is too long, or has no host.
    pub fn new(url: &str) -> Result<Self, ParseError> {
        let url = url.trim();
        if url.len() > MAX_URL_LENGTH {
            return Err(ParseError::too_long(url));
        }
        if !PAGE_URL_PATTERN.is_match(url) {
            if url.starts_with("http://") || url.starts_with("https://") {
                return Err(ParseError::contains_whitespace(url));
            }
            return Err(ParseError::unsupported_scheme(url));
        }

        let parsed = Url::parse(url).map_err(|_| ParseError::no_host(url))?;
        let Some(domain) = parsed.host_str().filter(|host| !host.is_empty()) else {
            return Err(ParseError::no_host(url));
        };

        debug!(url, domain, "page target accepted");
        Ok(Self {
            url: url.to_string(),
            domain: domain.to_string(),
            origin: parsed.origin().ascii_serialization(),
            credentials: None,
            requires_auth: false,
        })
    }

    /// Creates a target with attached login credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for an invalid URL or an empty username/password.
    pub fn with_credentials(url: &str, username: &str, password: &str) -> Result<Self, ParseError> {
        Self::from_parts(url, Some(username), Some(password))
    }

    /// Creates a target from optional credential parts, as collected from a form.
    ///
    /// Supplying only one of `username`/`password` is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for an invalid URL or incomplete credentials.
    pub fn from_parts(
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, ParseError> {
        let mut target = Self::new(url)?;
        match (username, password) {
            (None, None) => {}
            (username, password) => {
                let username = username.map(str::trim).unwrap_or_default();
                if username.is_empty() {
                    return Err(ParseError::empty_credential(&target.url, "username"));
                }
                let password = password.unwrap_or_default();
                if password.is_empty() {
                    return Err(ParseError::empty_credential(&target.url, "password"));
                }
                target.credentials = Some(Credentials::new_unchecked(username, password));
                target.requires_auth = true;
            }
        }
        Ok(target)
    }

    /// Marks the page as needing login even without attached credentials.
    ///
    /// The orchestrator then resolves credentials through the credential store.
    #[must_use]
    pub fn requiring_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// The page URL as submitted (trimmed).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Host name used as the credential and session key.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `scheme://host[:port]` of the page, used to derive the login endpoint.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Credentials attached at submission time, if any.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Whether the page must be fetched through an authenticated session.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }
}
