//! The HTTP capability the scraping pipeline consumes.
//!
//! The orchestrator and login flow only see this trait, so they can be driven
//! by [`HttpClient`](super::HttpClient) in production and by in-memory fakes
//! in tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::cookie::Jar;

use super::DownloadError;

/// A fully received page or form response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final HTTP status (after redirects).
    pub status: u16,
    /// Response body.
    pub body: Bytes,
    /// Wall-clock time spent on the request.
    pub elapsed: Duration,
    /// URL of the final response, after redirects.
    pub final_url: String,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// True when the body has zero bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Result of a completed file download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Where the file was written.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes_written: u64,
}

/// HTTP operations used by the pipeline. Redirects are followed transparently.
///
/// Cookies set by any response land in [`cookie_jar`](Self::cookie_jar) and
/// are sent on later requests to the matching domain.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Shared cookie store for this transport.
    fn cookie_jar(&self) -> Arc<Jar>;

    /// Forgets every cookie, so later requests carry no session.
    fn reset_cookies(&self);

    /// GETs a page and returns its full body.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, DownloadError>;

    /// POSTs an `application/x-www-form-urlencoded` body.
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<FetchResponse, DownloadError>;

    /// Streams `url` into `destination`, sending `referer` when given.
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        referer: Option<&str>,
    ) -> Result<DownloadOutcome, DownloadError>;
}
