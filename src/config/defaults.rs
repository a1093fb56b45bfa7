//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_host() -> String {
    "localhost".to_string()
}

pub fn default_port() -> u16 {
    25565
}

pub fn default_username() -> String {
    "bot".to_string()
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_level() -> String {
    "info".to_string()
}

// =============================================================================
// Bot Behaviour Defaults
// =============================================================================

pub fn default_prefix() -> String {
    "!".to_string()
}

pub fn default_reconnect_delay_ms() -> u64 {
    5_000
}

pub fn default_max_reconnect_delay_ms() -> u64 {
    300_000
}

pub fn default_ready_timeout_secs() -> u64 {
    30
}

pub fn default_shutdown_grace_ms() -> u64 {
    1_000
}

// =============================================================================
// Auto-Responder Defaults
// =============================================================================

pub fn default_min_reply_delay_ms() -> u64 {
    1_000
}

pub fn default_max_reply_delay_ms() -> u64 {
    3_000
}

/// Stock reply rules, used when `[auto_responder]` lists none.
pub fn default_reply_rules() -> Vec<(&'static str, &'static str)> {
    vec![
        (r"(?i)你好|hello|\bhi\b", "Hello!"),
        (r"(?i)机器人|\bbot\b", "I am YunShen Bot, happy to help!"),
        (r"(?i)天气怎么样|weather", "Nice weather today, good for mining!"),
        (r"(?i)谢谢|thanks", "You're welcome!"),
    ]
}
