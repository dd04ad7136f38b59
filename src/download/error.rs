//! Error types for the HTTP transport.
//!
//! These cover page fetches, login requests and file downloads, providing
//! context-rich error messages for logs and the run summary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to a remote site.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Authentication or authorization required to access the resource.
    #[error(
        "[AUTH] authentication required for {domain} (HTTP {status}) requesting {url}\n  Suggestion: attach credentials for {domain} or mark the page as requiring login"
    )]
    AuthRequired {
        /// The URL that requires authentication.
        url: String,
        /// The HTTP status code (401 or 403).
        status: u16,
        /// The domain requiring authentication.
        domain: String,
    },

    /// The server answered successfully but sent no body.
    #[error("empty response from {url}")]
    EmptyResponse {
        /// The URL that returned zero bytes.
        url: String,
    },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an authentication-required error.
    pub fn auth_required(url: impl Into<String>, status: u16, domain: impl Into<String>) -> Self {
        Self::AuthRequired {
            url: url.into(),
            status,
            domain: domain.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an empty-response error.
    pub fn empty_response(url: impl Into<String>) -> Self {
        Self::EmptyResponse { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

// Note on From trait implementations:
// No `From<reqwest::Error>` or `From<std::io::Error>`: every variant needs the
// url or path the source error does not carry. Use the constructors above.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_timeout_display() {
        let error = DownloadError::timeout("https://example.com/file.pdf");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/file.pdf"));
    }

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/file.pdf", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/file.pdf"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_download_error_empty_response_display() {
        let error = DownloadError::empty_response("https://example.com/thread.html");
        let msg = error.to_string();
        assert!(msg.starts_with("empty response"), "got: {msg}");
        assert!(msg.contains("thread.html"));
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/test.pdf"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/test.pdf"), "Expected path in: {msg}");
    }

    #[test]
    fn test_download_error_invalid_url_display() {
        let error = DownloadError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_download_error_auth_required_display() {
        let error = DownloadError::auth_required(
            "https://forum.example.com/private.html",
            403,
            "forum.example.com",
        );
        let msg = error.to_string();
        assert!(msg.starts_with("[AUTH]"), "Expected [AUTH] prefix in: {msg}");
        assert!(msg.contains("403"));
        assert!(msg.contains("forum.example.com"));
        assert!(msg.contains("requiring login"), "Expected suggestion in: {msg}");
    }
}
