//! CLI argument definitions using clap derive macros.

use std::fmt;
use std::path::PathBuf;

use clap::Parser;

use harvester_core::auth::CredentialMode;
use harvester_core::batch::CollisionPolicy;

/// Scrape file links from web pages and download them.
///
/// Harvester fetches each page (logging in first when asked), finds links to
/// media, documents and archives by file extension, and downloads them into
/// one directory.
#[derive(Parser)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Page URLs to process (reads one per line from stdin when omitted)
    pub urls: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file (default: ~/.config/harvester/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory downloads are written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only download these extensions (comma-separated or repeated; default: all)
    #[arg(short, long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Print the per-type link counts of each page and exit without downloading.
    /// Login options and --extensions apply as for a download run
    #[arg(long)]
    pub analyze_only: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Log in before fetching pages (credentials come from the credential store)
    #[arg(long)]
    pub login: bool,

    /// Username attached to every page (requires --password)
    #[arg(short = 'u', long, requires = "password")]
    pub username: Option<String>,

    /// Password attached to every page (requires --username)
    #[arg(short = 'p', long, requires = "username")]
    pub password: Option<String>,

    /// Credential file with `domain|username|password|description` lines
    #[arg(long, value_name = "PATH")]
    pub credentials_file: Option<PathBuf>,

    /// How missing credentials are obtained: saved (file, then prompt) or manual (always prompt)
    #[arg(long, value_name = "MODE")]
    pub credential_mode: Option<CredentialMode>,

    /// Never prompt for credentials
    #[arg(long)]
    pub no_prompt: bool,

    /// Login form path on the page's host
    #[arg(long, value_name = "PATH")]
    pub login_path: Option<String>,

    /// Login form field carrying the username
    #[arg(long, value_name = "NAME")]
    pub username_field: Option<String>,

    /// Login form field carrying the password
    #[arg(long, value_name = "NAME")]
    pub password_field: Option<String>,

    /// Text the login response must contain to count as success (repeatable)
    #[arg(long = "success-marker", value_name = "TEXT")]
    pub success_markers: Vec<String>,

    /// What to do when two files end with the same name: overwrite or suffix
    #[arg(long, value_name = "POLICY")]
    pub collision: Option<CollisionPolicy>,

    /// Send a desktop browser User-Agent instead of the tool's own
    #[arg(long)]
    pub browser_ua: bool,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("urls", &self.urls)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("config", &self.config)
            .field("output_dir", &self.output_dir)
            .field("extensions", &self.extensions)
            .field("analyze_only", &self.analyze_only)
            .field("json", &self.json)
            .field("login", &self.login)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("credentials_file", &self.credentials_file)
            .field("credential_mode", &self.credential_mode)
            .field("no_prompt", &self.no_prompt)
            .field("login_path", &self.login_path)
            .field("username_field", &self.username_field)
            .field("password_field", &self.password_field)
            .field("success_markers", &self.success_markers)
            .field("collision", &self.collision)
            .field("browser_ua", &self.browser_ua)
            .finish()
    }
}
