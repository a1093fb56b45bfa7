//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.host is required")]
    MissingHost,
    #[error("server.username is required")]
    MissingUsername,
    #[error("bot.prefix must be non-empty and contain no whitespace, got '{0}'")]
    InvalidPrefix(String),
    #[error("bot.reconnect_delay_ms must be greater than zero")]
    ZeroReconnectDelay,
    #[error("bot.reconnect_delay_ms ({base}) exceeds bot.max_reconnect_delay_ms ({max})")]
    ReconnectDelayAboveMax { base: u64, max: u64 },
    #[error("bot.ready_timeout_secs must be greater than zero")]
    ZeroReadyTimeout,
    #[error("auto_responder.min_delay_ms ({min}) exceeds max_delay_ms ({max})")]
    ReplyDelayRange { min: u64, max: u64 },
    #[error("auto_responder pattern '{pattern}' is not a valid regex: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Required fields
    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if config.server.username.trim().is_empty() {
        errors.push(ValidationError::MissingUsername);
    }

    let prefix = &config.bot.prefix;
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }

    // Reconnect policy
    let bot = &config.bot;
    if bot.reconnect_delay_ms == 0 {
        errors.push(ValidationError::ZeroReconnectDelay);
    } else if bot.reconnect_delay_ms > bot.max_reconnect_delay_ms {
        errors.push(ValidationError::ReconnectDelayAboveMax {
            base: bot.reconnect_delay_ms,
            max: bot.max_reconnect_delay_ms,
        });
    }
    if bot.ready_timeout_secs == 0 {
        errors.push(ValidationError::ZeroReadyTimeout);
    }

    // Auto-responder
    let responder = &config.auto_responder;
    if responder.min_delay_ms > responder.max_delay_ms {
        errors.push(ValidationError::ReplyDelayRange {
            min: responder.min_delay_ms,
            max: responder.max_delay_ms,
        });
    }
    for rule in &responder.replies {
        if let Err(e) = regex::Regex::new(&rule.pattern) {
            errors.push(ValidationError::InvalidPattern {
                pattern: rule.pattern.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
