//! govdash configuration file handling
//!
//! Provides default configuration generation and loading for the server.
//! Configuration files are TOML and live under the platform data directory
//! unless `--config` points elsewhere.
//!
//! Durations are human-readable (`"1day"`, `"36h"`, `"7days"`) and parsed
//! with `humantime`.

use govdash::governance::GovernanceSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default listen address
const DEFAULT_BIND: &str = "127.0.0.1:8080";

const DEFAULT_VOTING_DELAY: &str = "1day";
const DEFAULT_VOTING_PERIOD: &str = "7days";

/// govdash configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GovdashConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Proposal timing and request acceptance
    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Proposal store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Delay from creation to start of voting (must be at least 1s)
    #[serde(default = "default_voting_delay")]
    pub voting_delay: String,

    /// Length of the voting window (must be at least 1s)
    #[serde(default = "default_voting_period")]
    pub voting_period: String,

    /// Succeeded proposals left unexecuted this long report `expired`
    pub execution_window: Option<String>,

    /// Only accept requests for this network
    pub network_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite database file (required for the sqlite backend)
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_voting_delay() -> String {
    DEFAULT_VOTING_DELAY.to_string()
}

fn default_voting_period() -> String {
    DEFAULT_VOTING_PERIOD.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            voting_delay: default_voting_delay(),
            voting_period: default_voting_period(),
            execution_window: None,
            network_id: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    humantime::parse_duration(value)
        .map_err(|e| format!("Invalid duration for governance.{} ('{}'): {}", field, value, e).into())
}

impl GovernanceConfig {
    /// Convert to service settings, validating durations.
    pub fn to_settings(&self) -> Result<GovernanceSettings, Box<dyn std::error::Error>> {
        let voting_delay = parse_duration("voting_delay", &self.voting_delay)?.as_secs();
        let voting_period = parse_duration("voting_period", &self.voting_period)?.as_secs();
        if voting_delay < 1 {
            return Err("governance.voting_delay must be at least 1s".into());
        }
        if voting_period < 1 {
            return Err("governance.voting_period must be at least 1s".into());
        }
        let execution_window = self
            .execution_window
            .as_deref()
            .map(|w| parse_duration("execution_window", w).map(|d| d.as_secs()))
            .transpose()?;

        Ok(GovernanceSettings {
            voting_delay,
            voting_period,
            execution_window,
            network_id: self.network_id,
        })
    }
}

impl GovdashConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: GovdashConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Check cross-field constraints and return the service settings.
    pub fn validate(&self) -> Result<GovernanceSettings, Box<dyn std::error::Error>> {
        if self.store.backend == StoreBackend::Sqlite && self.store.path.is_none() {
            return Err("store.path is required when store.backend = \"sqlite\"".into());
        }
        self.server
            .bind
            .parse::<std::net::SocketAddr>()
            .map_err(|e| format!("Invalid server.bind '{}': {}", self.server.bind, e))?;
        self.governance.to_settings()
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        format!(
            r#"# govdash configuration

[server]
# Address the HTTP API listens on
bind = "{bind}"

[governance]
# Time from proposal creation until voting opens (minimum 1s)
voting_delay = "{delay}"

# Length of the voting window
voting_period = "{period}"

# Succeeded proposals not executed within this window report "expired"
# execution_window = "3days"

# Reject create/vote requests signed for any other network
# network_id = 1

[store]
# "memory" (lost on restart) or "sqlite"
backend = "memory"
# path = "/var/lib/govdash/governance.db"

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "{level}"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/govdash/govdash.log"
"#,
            bind = DEFAULT_BIND,
            delay = DEFAULT_VOTING_DELAY,
            period = DEFAULT_VOTING_PERIOD,
            level = DEFAULT_LOG_LEVEL,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, Self::generate_default_toml()).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default config file path
///
/// - Linux: ~/.local/share/govdash/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("govdash")
        .join("config.toml")
}
