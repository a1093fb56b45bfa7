//! Event handler trait.

use crate::context::BotHandle;
use crate::error::DispatchError;
use async_trait::async_trait;
use yunshen_link::Event;

/// Reacts to one named event.
///
/// Handlers run one at a time, in subscription order. A returned error or a
/// panic is logged by the dispatcher and never reaches the connection.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Event to subscribe to when loaded from a manifest.
    ///
    /// `None` means the manifest entry's source key names the event.
    fn event(&self) -> Option<&str> {
        None
    }

    /// Deliver at most one occurrence.
    fn once(&self) -> bool {
        false
    }

    async fn execute(&self, bot: &BotHandle, event: &Event) -> Result<(), DispatchError>;
}
