//! Handles shared between the supervisor and the units it hosts.

use crate::config::Config;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use yunshen_link::{Connection, LinkError};

/// Read-and-send view of the live connection.
///
/// Units, handlers and commands get this instead of the raw connection so
/// only the supervisor can close the session.
#[derive(Clone)]
pub struct BotHandle {
    conn: Arc<dyn Connection>,
}

impl BotHandle {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }

    /// The agent's in-game name.
    pub fn username(&self) -> &str {
        self.conn.username()
    }

    /// Send a chat line.
    pub async fn chat(&self, text: &str) -> Result<(), LinkError> {
        self.conn.chat(text).await
    }

    /// Opaque status fields reported by the protocol client.
    pub fn stats(&self) -> Vec<(String, String)> {
        self.conn.stats()
    }

    /// Whether `speaker` is the agent itself.
    pub fn is_self(&self, speaker: &str) -> bool {
        speaker == self.conn.username()
    }
}

impl fmt::Debug for BotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotHandle")
            .field("username", &self.username())
            .finish()
    }
}

/// The command prefix, changeable at runtime.
///
/// Survives reconnects; a change applies to the next inbound message.
#[derive(Debug, Clone)]
pub struct SharedPrefix(Arc<RwLock<String>>);

impl SharedPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(prefix.into())))
    }

    pub fn get(&self) -> String {
        self.0.read().clone()
    }

    pub fn set(&self, prefix: impl Into<String>) {
        *self.0.write() = prefix.into();
    }

    /// Strip the current prefix from `text`, if present.
    pub fn strip<'a>(&self, text: &'a str) -> Option<&'a str> {
        let prefix = self.0.read();
        text.strip_prefix(prefix.as_str())
    }
}

/// Process-lifetime counters shown by the status command.
#[derive(Debug)]
pub struct HostStats {
    started_at: DateTime<Utc>,
    sessions: AtomicU64,
    reconnects: AtomicU64,
}

impl Default for HostStats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            sessions: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
        }
    }
}

impl HostStats {
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Uptime rendered as `1d 2h 3m 4s`, dropping leading zero units.
    pub fn uptime(&self) -> String {
        format_duration((Utc::now() - self.started_at).num_seconds().max(0) as u64)
    }

    pub fn sessions(&self) -> u64 {
        self.sessions.load(Ordering::Relaxed)
    }

    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    /// Count a session that reached the ready state; returns its number.
    pub fn session_started(&self) -> u64 {
        self.sessions.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn reconnect_scheduled(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }
}

fn format_duration(total: u64) -> String {
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    match (days, hours, minutes) {
        (0, 0, 0) => format!("{seconds}s"),
        (0, 0, _) => format!("{minutes}m {seconds}s"),
        (0, _, _) => format!("{hours}h {minutes}m {seconds}s"),
        _ => format!("{days}d {hours}h {minutes}m {seconds}s"),
    }
}

/// Everything a session hands to the units it loads.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub config: Arc<Config>,
    pub prefix: SharedPrefix,
    pub stats: Arc<HostStats>,
}

impl HostContext {
    pub fn new(config: Arc<Config>) -> Self {
        let prefix = SharedPrefix::new(config.bot.prefix.clone());
        Self {
            config,
            prefix,
            stats: Arc::new(HostStats::default()),
        }
    }
}
