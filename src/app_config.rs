//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use harvester_core::auth::CredentialMode;
use harvester_core::batch::CollisionPolicy;

const APP_DIR_NAME: &str = "harvester";
const CONFIG_FILE_NAME: &str = "config.toml";
const CREDENTIALS_FILE_NAME: &str = "credentials.txt";

/// Key = value file configuration for harvester defaults.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Default output directory for downloads.
    pub output_dir: Option<PathBuf>,
    /// Credential file location.
    pub credentials_file: Option<PathBuf>,
    /// Default credential resolution mode.
    pub credential_mode: Option<CredentialMode>,
    /// Login form path appended to the page origin.
    pub login_path: Option<String>,
    /// Login form username field.
    pub username_field: Option<String>,
    /// Login form password field.
    pub password_field: Option<String>,
    /// Text that marks a successful login response.
    pub login_success_marker: Option<String>,
    /// Filename collision policy.
    pub collision: Option<CollisionPolicy>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Send a browser User-Agent.
    pub browser_user_agent: Option<bool>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_non_empty("login_path", self.login_path.as_deref())?;
        validate_non_empty("username_field", self.username_field.as_deref())?;
        validate_non_empty("password_field", self.password_field.as_deref())?;
        validate_non_empty("login_success_marker", self.login_success_marker.as_deref())?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

fn validate_non_empty(field: &str, value: Option<&str>) -> Result<()> {
    if value.is_some_and(|v| v.trim().is_empty()) {
        bail!("Invalid config value for `{field}`: must not be empty");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }

    /// Tracing level used when neither `RUST_LOG` nor CLI flags decide.
    #[must_use]
    pub fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Parsed config, or defaults when no file was loaded.
    #[must_use]
    pub fn file_config(&self) -> FileConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// Resolves the per-user harvester config directory.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/harvester`
/// 2. `$HOME/.config/harvester`
#[must_use]
pub fn resolve_config_dir() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR_NAME));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
}

/// Resolves default config path (`<config dir>/config.toml`).
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    resolve_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Resolves default credential file path (`<config dir>/credentials.txt`).
#[must_use]
pub fn resolve_default_credentials_path() -> Option<PathBuf> {
    resolve_config_dir().map(|dir| dir.join(CREDENTIALS_FILE_NAME))
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` (which must exist) or the default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref().filter(|p| p.exists()) else {
        return Ok(LoadedConfig { path, config: None });
    };

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "credentials_file" => {
                cfg.credentials_file = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "credential_mode" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.credential_mode = Some(
                    parsed
                        .parse::<CredentialMode>()
                        .map_err(anyhow::Error::msg)
                        .with_context(invalid)?,
                );
            }
            "login_path" => {
                cfg.login_path = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "username_field" => {
                cfg.username_field = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "password_field" => {
                cfg.password_field = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "login_success_marker" => {
                cfg.login_success_marker =
                    Some(parse_string_literal(value).with_context(invalid)?);
            }
            "collision" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.collision = Some(
                    parsed
                        .parse::<CollisionPolicy>()
                        .map_err(anyhow::Error::msg)
                        .with_context(invalid)?,
                );
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "browser_user_agent" => {
                cfg.browser_user_agent = Some(parse_boolean(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!(
                        "Invalid `verbosity` value '{}' on line {}",
                        parsed,
                        line_index + 1
                    )
                })?);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
