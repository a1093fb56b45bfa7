//! Core configuration types and loading.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use yunshen_link::{AuthMode, ConnectOptions};
use zeroize::Zeroizing;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime host configuration.
///
/// Every section has serde defaults, so a partial file is merged over the
/// built-in defaults section by section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Game server connection.
    #[serde(default)]
    pub server: ServerConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Bot behaviour (prefix, reconnect policy, operators).
    #[serde(default)]
    pub bot: BotConfig,
    /// Per-plugin enable overrides, keyed by unit name (case-insensitive).
    #[serde(default)]
    pub plugins: HashMap<String, bool>,
    /// Auto-responder rules.
    #[serde(default)]
    pub auto_responder: AutoResponderConfig,
    /// Prometheus endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Plugin overrides with lower-cased keys.
    pub fn plugin_overrides(&self) -> HashMap<String, bool> {
        self.plugins
            .iter()
            .map(|(name, enabled)| (name.to_lowercase(), *enabled))
            .collect()
    }

    /// Build the connector parameters for the configured server.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.server.host.clone(),
            port: self.server.port,
            username: self.server.username.clone(),
            password: self.server.password.clone().map(Zeroizing::new),
            auth: self.server.auth_mode(),
        }
    }
}

/// Game server connection parameters.
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    /// Account password; presence selects online authentication unless
    /// `auth` says otherwise.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub auth: Option<AuthMode>,
}

impl ServerConfig {
    /// Explicit `auth`, or derived from whether a password is configured.
    pub fn auth_mode(&self) -> AuthMode {
        match (self.auth, &self.password) {
            (Some(mode), _) => mode,
            (None, Some(_)) => AuthMode::Microsoft,
            (None, None) => AuthMode::Offline,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: None,
            auth: None,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("auth", &self.auth)
            .finish()
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Directory for daily-rolling log files, in addition to stdout.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

/// Bot behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Chat command prefix (default: "!").
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Reconnect after a failed start or a dropped session (default: true).
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,
    /// First reconnect delay in milliseconds (default: 5000).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Reconnect delay ceiling in milliseconds (default: 300000).
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,
    /// Seconds to wait for the login signal (default: 30).
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    /// Pause after closing the connection on shutdown (default: 1000).
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Players allowed to run administrative commands. Empty means everyone.
    #[serde(default)]
    pub operators: Vec<String>,
}

impl BotConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Whether `player` may run operator-only commands.
    pub fn is_operator(&self, player: &str) -> bool {
        self.operators.is_empty()
            || self
                .operators
                .iter()
                .any(|op| op.eq_ignore_ascii_case(player))
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            auto_reconnect: true,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            ready_timeout_secs: default_ready_timeout_secs(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            operators: Vec::new(),
        }
    }
}

/// One auto-responder rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplyRule {
    /// Regular expression matched against the chat text.
    pub pattern: String,
    /// Reply text, sent as `@<speaker> <response>`.
    pub response: String,
}

fn default_replies() -> Vec<ReplyRule> {
    default_reply_rules()
        .into_iter()
        .map(|(pattern, response)| ReplyRule {
            pattern: pattern.to_string(),
            response: response.to_string(),
        })
        .collect()
}

/// Auto-responder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AutoResponderConfig {
    /// Rules in priority order; the first match wins.
    #[serde(default = "default_replies")]
    pub replies: Vec<ReplyRule>,
    #[serde(default = "default_min_reply_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_reply_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for AutoResponderConfig {
    fn default() -> Self {
        Self {
            replies: default_replies(),
            min_delay_ms: default_min_reply_delay_ms(),
            max_delay_ms: default_max_reply_delay_ms(),
        }
    }
}

/// Prometheus metrics endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// HTTP port for `/metrics`; 0 disables the endpoint.
    #[serde(default)]
    pub port: u16,
}
