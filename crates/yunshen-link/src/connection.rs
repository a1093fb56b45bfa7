//! Connection and connector traits.

use crate::{Event, LinkError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use zeroize::Zeroizing;

/// Capacity of the inbound event queue created by the bundled connectors.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Stream of inbound events, in the order the client emitted them.
///
/// The stream ends (yields `None`) once the client drops its sending half.
pub type EventStream = mpsc::Receiver<Event>;

/// Authentication scheme requested from the protocol client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Offline-mode login, username only.
    Offline,
    /// Online login with account credentials.
    Microsoft,
}

impl AuthMode {
    /// Stable lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Microsoft => "microsoft",
        }
    }
}

/// Parameters for establishing a connection.
#[derive(Clone)]
pub struct ConnectOptions {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Account or offline user name.
    pub username: String,
    /// Account password, wiped from memory on drop.
    pub password: Option<Zeroizing<String>>,
    /// Authentication scheme.
    pub auth: AuthMode,
}

impl ConnectOptions {
    /// Options for an offline login.
    pub fn offline(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: None,
            auth: AuthMode::Offline,
        }
    }

    /// `host:port` form used in log lines and socket addresses.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("auth", &self.auth)
            .finish()
    }
}

/// A live connection to the game server.
///
/// Outbound calls only; inbound traffic arrives on the [`EventStream`]
/// returned alongside the connection.
#[async_trait]
pub trait Connection: Send + Sync {
    /// The name the server knows the agent by.
    fn username(&self) -> &str;

    /// Send a public chat message.
    async fn chat(&self, text: &str) -> Result<(), LinkError>;

    /// Ask the server to close the session gracefully.
    async fn quit(&self, reason: Option<&str>);

    /// Tear down the transport immediately.
    fn end(&self);

    /// Opaque status fields (health, position, latency...) for display.
    fn stats(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// A freshly established connection with its inbound event stream.
pub struct Link {
    /// Outbound half.
    pub connection: Arc<dyn Connection>,
    /// Inbound half.
    pub events: EventStream,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("username", &self.connection.username())
            .finish_non_exhaustive()
    }
}

/// Factory for connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a new connection.
    ///
    /// Returning `Ok` means the transport is up; the caller still waits for
    /// the [`LOGIN`](crate::event::LOGIN) event before treating the session
    /// as ready.
    async fn connect(&self, options: &ConnectOptions) -> Result<Link, LinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let mut opts = ConnectOptions::offline("localhost", 25565, "YunShenBot");
        opts.password = Some(Zeroizing::new("hunter2".to_string()));
        opts.auth = AuthMode::Microsoft;
        let rendered = format!("{opts:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn address_joins_host_and_port() {
        let opts = ConnectOptions::offline("mc.example.net", 25566, "bot");
        assert_eq!(opts.address(), "mc.example.net:25566");
    }

    #[test]
    fn auth_mode_names() {
        assert_eq!(AuthMode::Offline.as_str(), "offline");
        assert_eq!(
            serde_json::to_string(&AuthMode::Microsoft).unwrap(),
            "\"microsoft\""
        );
    }
}
