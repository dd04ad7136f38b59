//! Error types for input validation.

use thiserror::Error;

/// Maximum URL length to accept (standard browser limit).
/// URLs longer than this are rejected to prevent memory issues.
pub const MAX_URL_LENGTH: usize = 2000;

/// Errors raised while validating user-supplied page targets.
///
/// These are rejected at input time and never enter the download pipeline.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// URL is malformed or uses unsupported scheme
    #[error("invalid URL '{url}': {reason}\n  Suggestion: {suggestion}")]
    InvalidUrl {
        /// The URL that failed validation
        url: String,
        /// Why the URL is invalid
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// URL exceeds maximum allowed length
    #[error(
        "URL too long ({length} chars, max {max}): {url_preview}...\n  Suggestion: Check for extraneous content pasted with the URL"
    )]
    UrlTooLong {
        /// Truncated URL for display
        url_preview: String,
        /// Actual length
        length: usize,
        /// Maximum allowed
        max: usize,
    },

    /// A credential field attached to a target is missing or empty.
    #[error("invalid credentials for '{url}': {field} must not be empty")]
    EmptyCredentialField {
        /// The page the credentials were attached to
        url: String,
        /// Which field was empty (`username` or `password`)
        field: &'static str,
    },
}

impl ParseError {
    /// Creates an `InvalidUrl` error for a non-web URL scheme.
    #[must_use]
    pub fn unsupported_scheme(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: "only http:// and https:// pages are supported".to_string(),
            suggestion: "Use a full page address such as https://example.com/page.html"
                .to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a URL containing whitespace.
    #[must_use]
    pub fn contains_whitespace(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: "URL contains whitespace".to_string(),
            suggestion: "Percent-encode spaces as %20 or submit one URL per entry".to_string(),
        }
    }

    /// Creates an `InvalidUrl` error for a URL without a host.
    #[must_use]
    pub fn no_host(url: &str) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
            suggestion: "Ensure the URL includes a domain (e.g., example.com)".to_string(),
        }
    }

    /// Creates a `UrlTooLong` error for URLs exceeding the maximum length.
    #[must_use]
    pub fn too_long(url: &str) -> Self {
        Self::UrlTooLong {
            url_preview: url.chars().take(50).collect(),
            length: url.len(),
            max: MAX_URL_LENGTH,
        }
    }

    /// Creates an `EmptyCredentialField` error.
    #[must_use]
    pub fn empty_credential(url: &str, field: &'static str) -> Self {
        Self::EmptyCredentialField {
            url: url.to_string(),
            field,
        }
    }
}
