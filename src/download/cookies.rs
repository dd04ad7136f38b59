//! Resettable cookie store shared by every request of an [`HttpClient`].
//!
//! `reqwest`'s [`Jar`] cannot be emptied, so the client talks to this store,
//! which forwards to the current jar and can swap in a fresh one between runs.
//!
//! [`HttpClient`]: super::HttpClient

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use tracing::debug;
use url::Url;

/// Cookie provider whose backing jar can be replaced.
#[derive(Debug)]
pub(crate) struct SessionCookies {
    jar: RwLock<Arc<Jar>>,
}

impl Default for SessionCookies {
    fn default() -> Self {
        Self::new(Arc::new(Jar::default()))
    }
}

impl SessionCookies {
    pub(crate) fn new(jar: Arc<Jar>) -> Self {
        Self {
            jar: RwLock::new(jar),
        }
    }

    /// The jar currently receiving and supplying cookies.
    pub(crate) fn current(&self) -> Arc<Jar> {
        Arc::clone(&self.jar.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Drops every stored cookie by switching to an empty jar.
    pub(crate) fn reset(&self) {
        *self.jar.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(Jar::default());
        debug!("cookie jar reset");
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.current().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.current().cookies(url)
    }
}
