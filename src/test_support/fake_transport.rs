//! In-memory [`Transport`] with canned responses and a call log.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::cookie::Jar;

use crate::download::cookies::SessionCookies;
use crate::download::{DownloadError, DownloadOutcome, FetchResponse, Transport};

/// A recorded `download` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDownload {
    pub url: String,
    pub destination: PathBuf,
    pub referer: Option<String>,
}

/// Transport answering from fixed maps; unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct FakeTransport {
    cookies: SessionCookies,
    cookie_resets: Mutex<usize>,
    pages: HashMap<String, Result<Bytes, u16>>,
    posts: HashMap<String, Bytes>,
    files: HashMap<String, Result<Bytes, u16>>,
    calls: Mutex<Vec<String>>,
    downloads: Mutex<Vec<RecordedDownload>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl AsRef<[u8]>) -> Self {
        self.pages
            .insert(url.to_string(), Ok(Bytes::copy_from_slice(body.as_ref())));
        self
    }

    pub fn with_page_status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Err(status));
        self
    }

    pub fn with_post(mut self, url: &str, body: impl AsRef<[u8]>) -> Self {
        self.posts
            .insert(url.to_string(), Bytes::copy_from_slice(body.as_ref()));
        self
    }

    pub fn with_file(mut self, url: &str, body: impl AsRef<[u8]>) -> Self {
        self.files
            .insert(url.to_string(), Ok(Bytes::copy_from_slice(body.as_ref())));
        self
    }

    pub fn with_file_status(mut self, url: &str, status: u16) -> Self {
        self.files.insert(url.to_string(), Err(status));
        self
    }

    /// Every request in order, as `"<VERB> <url>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// How many times the cookie jar was reset.
    pub fn cookie_resets(&self) -> usize {
        self.cookie_resets.lock().map_or(0, |n| *n)
    }

    fn record(&self, verb: &str, url: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("{verb} {url}"));
        }
    }

    fn respond(url: &str, body: &Bytes) -> FetchResponse {
        FetchResponse {
            status: 200,
            body: body.clone(),
            elapsed: Duration::from_millis(1),
            final_url: url.to_string(),
        }
    }
}

fn status_error(url: &str, status: u16) -> DownloadError {
    if matches!(status, 401 | 403) {
        DownloadError::auth_required(url, status, "fake")
    } else {
        DownloadError::http_status(url, status)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn cookie_jar(&self) -> Arc<Jar> {
        self.cookies.current()
    }

    fn reset_cookies(&self) {
        self.cookies.reset();
        if let Ok(mut resets) = self.cookie_resets.lock() {
            *resets += 1;
        }
    }

    async fn fetch(&self, url: &str) -> Result<FetchResponse, DownloadError> {
        self.record("GET", url);
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(Self::respond(url, body)),
            Some(Err(status)) => Err(status_error(url, *status)),
            None => Err(status_error(url, 404)),
        }
    }

    async fn post_form(
        &self,
        url: &str,
        _form: &[(String, String)],
    ) -> Result<FetchResponse, DownloadError> {
        self.record("POST", url);
        self.posts
            .get(url)
            .map(|body| Self::respond(url, body))
            .ok_or_else(|| status_error(url, 404))
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
        referer: Option<&str>,
    ) -> Result<DownloadOutcome, DownloadError> {
        self.record("DOWNLOAD", url);
        if let Ok(mut downloads) = self.downloads.lock() {
            downloads.push(RecordedDownload {
                url: url.to_string(),
                destination: destination.to_path_buf(),
                referer: referer.map(str::to_string),
            });
        }
        let body = match self.files.get(url) {
            Some(Ok(body)) => body,
            Some(Err(status)) => return Err(status_error(url, *status)),
            None => return Err(status_error(url, 404)),
        };
        std::fs::write(destination, body).map_err(|e| DownloadError::io(destination, e))?;
        Ok(DownloadOutcome {
            path: destination.to_path_buf(),
            bytes_written: body.len() as u64,
        })
    }
}
