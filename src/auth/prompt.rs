//! Interactive credential prompting.

use std::io::{self, IsTerminal};

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password};

/// Asks a human for credentials.
///
/// [`CredentialStore`](super::CredentialStore) validates answers and
/// re-prompts on empty input, so implementations return raw strings.
pub trait CredentialPrompt {
    /// Asks for a username and password for `domain`.
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal cannot be read.
    fn ask_credentials(&mut self, domain: &str) -> io::Result<(String, String)>;

    /// Asks whether freshly entered credentials should be saved.
    ///
    /// # Errors
    ///
    /// Returns an error when the terminal cannot be read.
    fn confirm_save(&mut self, domain: &str) -> io::Result<bool>;

    /// False when there is nobody to ask.
    fn is_interactive(&self) -> bool {
        true
    }
}

/// Terminal prompt with a hidden password field.
#[derive(Default)]
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl TerminalPrompt {
    /// Creates a prompt using the default colorful theme.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a terminal prompt when stdin is a TTY, otherwise [`NoPrompt`].
    #[must_use]
    pub fn if_terminal() -> Box<dyn CredentialPrompt + Send> {
        if io::stdin().is_terminal() {
            Box::new(Self::new())
        } else {
            Box::new(NoPrompt)
        }
    }
}

impl CredentialPrompt for TerminalPrompt {
    fn ask_credentials(&mut self, domain: &str) -> io::Result<(String, String)> {
        let username: String = Input::with_theme(&self.theme)
            .with_prompt(format!("Username for {domain}"))
            .allow_empty(true)
            .interact_text()
            .map_err(io::Error::other)?;
        let password = Password::with_theme(&self.theme)
            .with_prompt(format!("Password for {domain}"))
            .allow_empty_password(true)
            .interact()
            .map_err(io::Error::other)?;
        Ok((username, password))
    }

    fn confirm_save(&mut self, domain: &str) -> io::Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(format!("Save credentials for {domain}?"))
            .default(false)
            .interact()
            .map_err(io::Error::other)
    }
}

/// Prompt for non-interactive runs; always declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl CredentialPrompt for NoPrompt {
    fn ask_credentials(&mut self, _domain: &str) -> io::Result<(String, String)> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no interactive terminal",
        ))
    }

    fn confirm_save(&mut self, _domain: &str) -> io::Result<bool> {
        Ok(false)
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
