//! Named events emitted by a game connection.
//!
//! The host treats event names and argument shapes as an opaque contract
//! owned by the protocol client. A few names carry lifecycle meaning and are
//! exposed as constants so callers do not scatter string literals.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Ready signal: the client finished logging in.
pub const LOGIN: &str = "login";
/// The agent entered the world.
pub const SPAWN: &str = "spawn";
/// A chat line, carrying `(speaker, text)`.
pub const CHAT: &str = "chat";
/// The connection closed, carrying an optional reason.
pub const END: &str = "end";
/// A transport or protocol error, carrying a description.
pub const ERROR: &str = "error";
/// The server removed the agent, carrying `(reason, logged_in)`.
pub const KICKED: &str = "kicked";
/// The agent died, optionally carrying `(x, y, z)`.
pub const DEATH: &str = "death";

/// One occurrence of a named event with its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name (e.g. `chat`, `end`).
    #[serde(rename = "event")]
    pub name: String,
    /// Positional arguments in the order the client emitted them.
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Event {
    /// Create an event with the given name and arguments.
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Create an event without arguments.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Build a `chat` event.
    pub fn chat(speaker: &str, text: &str) -> Self {
        Self::new(CHAT, vec![Value::from(speaker), Value::from(text)])
    }

    /// Build an `end` event.
    pub fn end(reason: &str) -> Self {
        Self::new(END, vec![Value::from(reason)])
    }

    /// Build an `error` event.
    pub fn error(description: &str) -> Self {
        Self::new(ERROR, vec![Value::from(description)])
    }

    /// Build a `kicked` event.
    pub fn kicked(reason: &str, logged_in: bool) -> Self {
        Self::new(KICKED, vec![Value::from(reason), Value::from(logged_in)])
    }

    /// Get argument `n` as a string slice, if it is a JSON string.
    pub fn arg_str(&self, n: usize) -> Option<&str> {
        self.args.get(n).and_then(Value::as_str)
    }

    /// Get argument `n` as a bool, if it is a JSON bool.
    pub fn arg_bool(&self, n: usize) -> Option<bool> {
        self.args.get(n).and_then(Value::as_bool)
    }

    /// Get argument `n` as a float, if it is a JSON number.
    pub fn arg_f64(&self, n: usize) -> Option<f64> {
        self.args.get(n).and_then(Value::as_f64)
    }

    /// Whether this event ends the connection (`end`, `error`, `kicked`).
    pub fn is_termination(&self) -> bool {
        matches!(self.name.as_str(), END | ERROR | KICKED)
    }

    /// Render the arguments for log lines, joining string arguments without quotes.
    pub fn describe_args(&self) -> String {
        self.args
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.describe_args())
        }
    }
}
