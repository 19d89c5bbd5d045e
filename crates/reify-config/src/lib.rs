//! Configuration for the reification runtime.
//!
//! Settings come from an optional TOML file named by [`REIFY_CONFIG_ENV_VAR`]; the verification
//! mode can additionally be overridden with [`REIFY_MODE_ENV_VAR`]:
//!
//! ```toml
//! [verification]
//! mode = "NORMAL"
//!
//! [witness]
//! enabled = true
//!
//! [logging]
//! level = "reify.check=debug"
//! json = false
//! ```

mod logging;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use logging::{init_tracing, LoggingConfig};

pub const REIFY_CONFIG_ENV_VAR: &str = "REIFY_CONFIG_PATH";
pub const REIFY_MODE_ENV_VAR: &str = "REIFY_MODE";

/// How aggressively cast verification runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Check every instrumented cast.
    Full,
    /// Check type-parameter casts at method entry, method exit and storage.
    Normal,
    /// Check type-parameter casts at storage sites only.
    Minimal,
    #[default]
    Disabled,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Full => "FULL",
            Mode::Normal => "NORMAL",
            Mode::Minimal => "MINIMAL",
            Mode::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FULL" => Ok(Mode::Full),
            "NORMAL" => Ok(Mode::Normal),
            "MINIMAL" => Ok(Mode::Minimal),
            "DISABLED" => Ok(Mode::Disabled),
            _ => Err(ConfigError::InvalidMode(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default)]
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessConfig {
    /// Initial state of the witness channel.
    #[serde(default = "WitnessConfig::default_enabled")]
    pub enabled: bool,
}

impl WitnessConfig {
    fn default_enabled() -> bool {
        true
    }
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReifyConfig {
    #[serde(default)]
    pub verification: VerificationConfig,

    #[serde(default)]
    pub witness: WitnessConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid verification mode {0:?}; expected FULL, NORMAL, MINIMAL or DISABLED")]
    InvalidMode(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` embeds a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl ReifyConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load the file named by `REIFY_CONFIG_PATH` (defaults when unset), then apply the
    /// `REIFY_MODE` override.
    ///
    /// An unparseable `REIFY_MODE` is not an error: it is logged and verification is disabled.
    pub fn from_environment() -> Result<Self, ConfigError> {
        let mut config = match env_var(REIFY_CONFIG_ENV_VAR) {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        if let Some(raw) = env_var(REIFY_MODE_ENV_VAR) {
            config.verification.mode = parse_mode_or_disabled(&raw);
        }
        Ok(config)
    }
}

/// Resolve the verification mode from the environment, never failing.
///
/// Any problem (unreadable config file, bad TOML, unknown mode name) is logged and resolves to
/// [`Mode::Disabled`].
pub fn resolve_mode() -> Mode {
    match ReifyConfig::from_environment() {
        Ok(config) => config.verification.mode,
        Err(err) => {
            tracing::warn!(
                target: "reify.config",
                error = %err,
                "failed to load reification config; verification disabled"
            );
            Mode::Disabled
        }
    }
}

fn parse_mode_or_disabled(raw: &str) -> Mode {
    raw.parse().unwrap_or_else(|err: ConfigError| {
        tracing::warn!(
            target: "reify.config",
            error = %err,
            "ignoring {REIFY_MODE_ENV_VAR}; verification disabled"
        );
        Mode::Disabled
    })
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

/// Run `f` while holding the configuration environment lock.
///
/// Environment variables are process-global; tests that set [`REIFY_CONFIG_ENV_VAR`] or
/// [`REIFY_MODE_ENV_VAR`] wrap the mutation and the lookup in this helper so concurrent tests do
/// not observe each other's overrides.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = CONFIG_ENV_LOCK
        .get_or_init(|| ReentrantMutex::new(()))
        .lock();
    f()
}
