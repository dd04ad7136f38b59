//! Form-based login that primes the shared cookie jar.
//!
//! Login is a best-effort sequence: GET the login page (to collect any
//! pre-login cookies), POST the credentials, then decide from the response
//! body whether the site accepted them. Failures never abort the page fetch
//! that follows; they only downgrade the status to
//! [`AuthStatus::Unconfirmed`].

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::Jar;
use tracing::{debug, info, instrument, warn};

use super::Credentials;
use crate::download::Transport;

/// Login path of the default forum profile.
pub const DEFAULT_LOGIN_PATH: &str = "/login.php?do=login";
/// Username form field of the default forum profile.
pub const DEFAULT_USERNAME_FIELD: &str = "vb_login_username";
/// Password form field of the default forum profile.
pub const DEFAULT_PASSWORD_FIELD: &str = "vb_login_password";
/// Body text the default forum profile shows after a successful login.
pub const DEFAULT_SUCCESS_MARKER: &str = "Thank you for logging in";

/// Decides from a response body whether the login succeeded.
pub trait LoginCheck: Send + Sync {
    /// True when `body` shows a logged-in session.
    fn is_logged_in(&self, body: &str) -> bool;
}

impl<F> LoginCheck for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_logged_in(&self, body: &str) -> bool {
        self(body)
    }
}

/// Looks for any of a set of marker strings, ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerCheck {
    markers: Vec<String>,
}

impl MarkerCheck {
    /// Creates a check; blank markers are dropped.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.trim().is_empty())
                .map(|m| m.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Configured markers (lowercased).
    #[must_use]
    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl Default for MarkerCheck {
    fn default() -> Self {
        Self::new([DEFAULT_SUCCESS_MARKER])
    }
}

impl LoginCheck for MarkerCheck {
    fn is_logged_in(&self, body: &str) -> bool {
        let haystack = body.to_ascii_lowercase();
        self.markers.iter().any(|marker| haystack.contains(marker))
    }
}

/// How to log in to a site.
#[derive(Clone)]
pub struct LoginProfile {
    /// Path (with optional query) appended to the page origin.
    pub login_path: String,
    /// Form field carrying the username.
    pub username_field: String,
    /// Form field carrying the password.
    pub password_field: String,
    /// Additional constant form fields.
    pub extra_fields: Vec<(String, String)>,
    check: Arc<dyn LoginCheck>,
}

impl fmt::Debug for LoginProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginProfile")
            .field("login_path", &self.login_path)
            .field("username_field", &self.username_field)
            .field("password_field", &self.password_field)
            .field("extra_fields", &self.extra_fields)
            .finish_non_exhaustive()
    }
}

impl Default for LoginProfile {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            username_field: DEFAULT_USERNAME_FIELD.to_string(),
            password_field: DEFAULT_PASSWORD_FIELD.to_string(),
            extra_fields: vec![
                ("do".to_string(), "login".to_string()),
                ("cookieuser".to_string(), "1".to_string()),
            ],
            check: Arc::new(MarkerCheck::default()),
        }
    }
}

impl LoginProfile {
    /// Sets the login form path.
    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// Sets the username form field name.
    #[must_use]
    pub fn with_username_field(mut self, field: impl Into<String>) -> Self {
        self.username_field = field.into();
        self
    }

    /// Sets the password form field name.
    #[must_use]
    pub fn with_password_field(mut self, field: impl Into<String>) -> Self {
        self.password_field = field.into();
        self
    }

    /// Replaces the success predicate.
    #[must_use]
    pub fn with_check(mut self, check: impl LoginCheck + 'static) -> Self {
        self.check = Arc::new(check);
        self
    }

    /// Runs the success predicate on `body`.
    #[must_use]
    pub fn is_logged_in(&self, body: &str) -> bool {
        self.check.is_logged_in(body)
    }

    /// Absolute login URL for a page origin such as `https://host:8443`.
    #[must_use]
    pub fn login_url(&self, origin: &str) -> String {
        let origin = origin.trim_end_matches('/');
        if self.login_path.starts_with('/') {
            format!("{origin}{}", self.login_path)
        } else {
            format!("{origin}/{}", self.login_path)
        }
    }

    fn form(&self, credentials: &Credentials) -> Vec<(String, String)> {
        let mut form = vec![
            (
                self.username_field.clone(),
                credentials.username().to_string(),
            ),
            (
                self.password_field.clone(),
                credentials.password().to_string(),
            ),
        ];
        form.extend(self.extra_fields.iter().cloned());
        form
    }
}

/// Outcome of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// The login response passed the success check.
    Authenticated,
    /// The login could not be confirmed; requests proceed anyway.
    Unconfirmed,
}

impl AuthStatus {
    /// Stable lowercase name for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::Unconfirmed => "unconfirmed",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login state for one domain within one run. Never persisted.
#[derive(Clone)]
pub struct SessionAuthState {
    domain: String,
    cookie_jar: Arc<Jar>,
    status: AuthStatus,
}

impl fmt::Debug for SessionAuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAuthState")
            .field("domain", &self.domain)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl SessionAuthState {
    /// Domain this state belongs to.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Cookie jar holding the session cookies.
    #[must_use]
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.cookie_jar
    }

    /// Login outcome.
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.status
    }

    /// True when the login was confirmed.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}

/// Performs the login sequence with a [`LoginProfile`].
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    profile: LoginProfile,
}

impl AuthSession {
    /// Creates a session driver for `profile`.
    #[must_use]
    pub fn new(profile: LoginProfile) -> Self {
        Self { profile }
    }

    /// The active login profile.
    #[must_use]
    pub fn profile(&self) -> &LoginProfile {
        &self.profile
    }

    /// Logs in to `origin` and returns the resulting state for `domain`.
    ///
    /// Never fails: transport errors are logged and reported as
    /// [`AuthStatus::Unconfirmed`].
    #[instrument(skip(self, transport, credentials), fields(username = %credentials.username()))]
    pub async fn authenticate(
        &self,
        transport: &dyn Transport,
        origin: &str,
        domain: &str,
        credentials: &Credentials,
    ) -> SessionAuthState {
        let login_url = self.profile.login_url(origin);

        debug!(phase = "fetching_login_page", url = %login_url);
        if let Err(e) = transport.fetch(&login_url).await {
            debug!(error = %e, "login page fetch failed, submitting anyway");
        }

        debug!(phase = "submitting_credentials", url = %login_url);
        let status = match transport
            .post_form(&login_url, &self.profile.form(credentials))
            .await
        {
            Ok(response) if self.profile.is_logged_in(&response.text()) => {
                AuthStatus::Authenticated
            }
            Ok(response) => {
                debug!(status = response.status, "login response lacks success marker");
                AuthStatus::Unconfirmed
            }
            Err(e) => {
                warn!(error = %e, "login request failed");
                AuthStatus::Unconfirmed
            }
        };

        match status {
            AuthStatus::Authenticated => info!(domain, "login successful"),
            AuthStatus::Unconfirmed => {
                warn!(domain, "login not confirmed, continuing without confirmation");
            }
        }

        SessionAuthState {
            domain: domain.to_string(),
            cookie_jar: transport.cookie_jar(),
            status,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::HttpClient;
    use crate::test_support::fake_transport::FakeTransport;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use reqwest::cookie::CookieStore;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn creds() -> Credentials {
        Credentials::new_unchecked("alice", "hunter2")
    }

    #[test]
    fn test_default_profile_is_forum_login() {
        let profile = LoginProfile::default();
        assert_eq!(
            profile.login_url("https://forum.example.com"),
            "https://forum.example.com/login.php?do=login"
        );
        let form = profile.form(&creds());
        assert_eq!(form[0], ("vb_login_username".into(), "alice".into()));
        assert_eq!(form[1], ("vb_login_password".into(), "hunter2".into()));
        assert!(form.contains(&("cookieuser".into(), "1".into())));
        assert!(profile.is_logged_in("<p>Thank you for logging in, alice.</p>"));
    }

    #[test]
    fn test_login_url_handles_relative_path_and_trailing_slash() {
        let profile = LoginProfile::default().with_login_path("signin");
        assert_eq!(
            profile.login_url("https://example.com/"),
            "https://example.com/signin"
        );
    }

    #[test]
    fn test_marker_check_is_case_insensitive_and_skips_blank() {
        let check = MarkerCheck::new(["Welcome back", "  "]);
        assert_eq!(check.markers(), ["welcome back"]);
        assert!(check.is_logged_in("WELCOME BACK, alice"));
        assert!(!check.is_logged_in("please log in"));
    }

    #[test]
    fn test_closure_login_check() {
        let profile =
            LoginProfile::default().with_check(|body: &str| body.contains("logout.php"));
        assert!(profile.is_logged_in("<a href='logout.php'>"));
        assert!(!profile.is_logged_in("Thank you for logging in"));
    }

    #[tokio::test]
    async fn test_authenticate_marker_found_is_authenticated() {
        let transport = FakeTransport::new()
            .with_page("https://forum.example.com/login.php?do=login", "<form>")
            .with_post(
                "https://forum.example.com/login.php?do=login",
                "Thank you for logging in",
            );
        let state = AuthSession::default()
            .authenticate(
                &transport,
                "https://forum.example.com",
                "forum.example.com",
                &creds(),
            )
            .await;
        assert_eq!(state.status(), AuthStatus::Authenticated);
        assert_eq!(state.domain(), "forum.example.com");

        let calls = transport.calls();
        assert_eq!(calls[0], "GET https://forum.example.com/login.php?do=login");
        assert_eq!(calls[1], "POST https://forum.example.com/login.php?do=login");
    }

    #[tokio::test]
    async fn test_authenticate_login_page_failure_is_ignored() {
        let transport = FakeTransport::new().with_post(
            "https://forum.example.com/login.php?do=login",
            "Thank you for logging in",
        );
        let state = AuthSession::default()
            .authenticate(
                &transport,
                "https://forum.example.com",
                "forum.example.com",
                &creds(),
            )
            .await;
        assert!(state.is_authenticated());
    }

    #[tokio::test]
    async fn test_authenticate_missing_marker_is_unconfirmed() {
        let transport = FakeTransport::new().with_post(
            "https://forum.example.com/login.php?do=login",
            "Invalid password",
        );
        let state = AuthSession::default()
            .authenticate(
                &transport,
                "https://forum.example.com",
                "forum.example.com",
                &creds(),
            )
            .await;
        assert_eq!(state.status(), AuthStatus::Unconfirmed);
    }

    #[tokio::test]
    async fn test_authenticate_post_failure_is_unconfirmed() {
        let transport = FakeTransport::new();
        let state = AuthSession::default()
            .authenticate(
                &transport,
                "https://forum.example.com",
                "forum.example.com",
                &creds(),
            )
            .await;
        assert_eq!(state.status(), AuthStatus::Unconfirmed);
    }

    #[tokio::test]
    async fn test_authenticate_against_server_stores_session_cookie() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/login.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "bb_lastvisit=1; Path=/")
                    .set_body_string("<form>"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/login.php"))
            .and(query_param("do", "login"))
            .and(body_string_contains("vb_login_username=alice"))
            .and(body_string_contains("cookieuser=1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "bb_sessionhash=xyz; Path=/")
                    .set_body_string("Thank you for logging in, alice."),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new().unwrap();
        let state = AuthSession::default()
            .authenticate(&client, &mock_server.uri(), "127.0.0.1", &creds())
            .await;
        assert!(state.is_authenticated());

        let origin = url::Url::parse(&mock_server.uri()).unwrap();
        let cookies = state.cookie_jar().cookies(&origin).unwrap();
        let cookies = cookies.to_str().unwrap();
        assert!(cookies.contains("bb_sessionhash=xyz"), "{cookies}");
        assert!(cookies.contains("bb_lastvisit=1"), "{cookies}");
    }
}
