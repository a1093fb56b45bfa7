//! Capped exponential reconnect delay.

use crate::config::BotConfig;
use std::time::Duration;

/// Growth factor applied per consecutive failed attempt.
pub const BACKOFF_FACTOR: f64 = 1.5;

/// `delay(n) = min(base * factor^(n-1), max)` for attempt `n >= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub factor: f64,
    pub max: Duration,
}

impl ReconnectPolicy {
    pub fn from_config(bot: &BotConfig) -> Self {
        Self {
            base: bot.reconnect_delay(),
            factor: BACKOFF_FACTOR,
            max: bot.max_reconnect_delay(),
        }
    }

    /// Delay before attempt `attempt` (1-based; 0 is treated as 1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_ms = self.base.as_millis() as f64;
        let max_ms = self.max.as_millis() as f64;
        let delay_ms = (base_ms * self.factor.powi(exponent)).min(max_ms);
        Duration::from_millis(delay_ms as u64)
    }
}
