//! Credentials and form-based login.
//!
//! [`CredentialStore`] decides where a domain's username and password come
//! from (session cache, credential file or an interactive prompt), and
//! [`AuthSession`] uses them to log in so the shared cookie jar carries the
//! session into later page and file requests.

mod credentials;
mod prompt;
mod session;

pub use credentials::{
    CredentialError, CredentialFile, CredentialMode, CredentialRecord, CredentialStore,
    Credentials, MAX_PROMPT_ATTEMPTS,
};
pub use prompt::{CredentialPrompt, NoPrompt, TerminalPrompt};
pub use session::{
    AuthSession, AuthStatus, DEFAULT_LOGIN_PATH, DEFAULT_PASSWORD_FIELD, DEFAULT_SUCCESS_MARKER,
    DEFAULT_USERNAME_FIELD, LoginCheck, LoginProfile, MarkerCheck, SessionAuthState,
};
