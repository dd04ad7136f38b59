//! `reqwest`-backed implementation of [`Transport`].
//!
//! This module provides the `HttpClient` struct which fetches pages, submits
//! login forms and streams downloads to disk, sharing one cookie jar across
//! all of them.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{Client, Method, Response};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::cookies::SessionCookies;
use super::error::DownloadError;
use super::transport::{DownloadOutcome, FetchResponse, Transport};
use crate::user_agent;

/// Common URL patterns indicating a login redirect.
const LOGIN_PATTERNS: &[&str] = &[
    "/login",
    "/signin",
    "/sign-in",
    "/auth/",
    "/sso",
    "do=login",
    "/member.php",
    "/ucp.php?mode=login",
];

/// Construction options for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// TCP connect timeout.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout (covers large file bodies).
    pub read_timeout_secs: u64,
    /// `User-Agent` header sent on every request.
    pub user_agent: String,
    /// Initial cookie jar; a fresh one is created when `None`.
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            user_agent: user_agent::default_user_agent(),
            cookie_jar: None,
        }
    }
}

/// HTTP client for page fetches, form posts and streaming downloads.
///
/// Create it once and reuse it, taking advantage of connection pooling.
/// Cookies set by login responses are kept in the shared jar and attached to
/// later requests for the same domain until
/// [`reset_cookies`](Transport::reset_cookies) swaps in an empty jar.
///
/// # Example
///
/// ```no_run
/// use harvester_core::download::{HttpClient, Transport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let page = client.fetch("https://example.com/gallery.html").await?;
/// println!("{} bytes in {:?}", page.body.len(), page.elapsed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    cookies: Arc<SessionCookies>,
}

impl HttpClient {
    /// Creates a client with default timeouts, user agent and a fresh cookie jar.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_options(ClientOptions::default())
    }

    /// Creates a client from explicit options.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    #[instrument(level = "debug", skip(options), fields(user_agent = %options.user_agent))]
    pub fn with_options(options: ClientOptions) -> Result<Self, reqwest::Error> {
        let cookies = Arc::new(SessionCookies::new(
            options
                .cookie_jar
                .unwrap_or_else(|| Arc::new(Jar::default())),
        ));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(options.connect_timeout_secs))
            .timeout(Duration::from_secs(options.read_timeout_secs))
            .gzip(true)
            .user_agent(options.user_agent)
            .cookie_provider(Arc::clone(&cookies))
            .build()?;
        Ok(Self { client, cookies })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        referer: Option<&str>,
        form_body: Option<String>,
    ) -> Result<Response, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let mut request = self.client.request(method, parsed);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }
        if let Some(body) = form_body {
            request = request
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        check_status(url, response)
    }

    async fn read_body(
        &self,
        url: &str,
        response: Response,
        started: Instant,
    ) -> Result<FetchResponse, DownloadError> {
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;
        Ok(FetchResponse {
            status,
            body,
            elapsed: started.elapsed(),
            final_url,
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    fn cookie_jar(&self) -> Arc<Jar> {
        self.cookies.current()
    }

    fn reset_cookies(&self) {
        self.cookies.reset();
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<FetchResponse, DownloadError> {
        let started = Instant::now();
        let response = self.send(Method::GET, url, None, None).await?;
        let page = self.read_body(url, response, started).await?;
        debug!(
            status = page.status,
            bytes = page.body.len(),
            elapsed_ms = page.elapsed.as_millis(),
            "page fetched"
        );
        Ok(page)
    }

    #[instrument(skip(self, form), fields(url = %url, fields = form.len()))]
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<FetchResponse, DownloadError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        let started = Instant::now();
        let response = self.send(Method::POST, url, None, Some(body)).await?;
        self.read_body(url, response, started).await
    }

    #[instrument(skip(self, destination), fields(url = %url, path = %destination.display()))]
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        referer: Option<&str>,
    ) -> Result<DownloadOutcome, DownloadError> {
        debug!("starting download");
        let response = self.send(Method::GET, url, referer, None).await?;

        if let Some(auth_err) = detect_login_redirect(url, &response) {
            return Err(auth_err);
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        let stream_result = stream_to_file(&mut file, response, url, destination).await;
        if stream_result.is_err() {
            debug!(path = %destination.display(), "cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(destination).await;
        }
        let bytes_written = stream_result?;

        info!(
            path = %destination.display(),
            bytes = bytes_written,
            "download complete"
        );
        Ok(DownloadOutcome {
            path: destination.to_path_buf(),
            bytes_written,
        })
    }
}

/// Maps non-success statuses to errors; 401/403 become `AuthRequired`.
fn check_status(url: &str, response: Response) -> Result<Response, DownloadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let status_code = status.as_u16();
    if matches!(status_code, 401 | 403) {
        let domain = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(std::string::ToString::to_string))
            .unwrap_or_else(|| url.to_string());
        return Err(DownloadError::auth_required(url, status_code, domain));
    }
    Err(DownloadError::http_status(url, status_code))
}

/// Streams response body to file, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    file: &mut File,
    response: Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

/// Detects a file link that redirected to an HTML login page.
fn detect_login_redirect(original_url: &str, response: &Response) -> Option<DownloadError> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.to_ascii_lowercase().contains("text/html") {
        return None;
    }

    // Only classify as auth-required when a login pattern IS present.
    // Without a pattern match, it may be a server error page, not auth.
    let response_url = response.url().as_str().to_lowercase();
    if !LOGIN_PATTERNS
        .iter()
        .any(|pattern| response_url.contains(pattern))
    {
        return None;
    }

    let domain = response
        .url()
        .host_str()
        .map_or_else(|| "unknown".to_string(), std::string::ToString::to_string);
    debug!(url = %original_url, response_url = %response_url, "login redirect detected");
    Some(DownloadError::auth_required(original_url, 0, domain))
}
