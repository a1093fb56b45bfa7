//! The lifecycle unit trait.

use crate::context::{BotHandle, HostContext};
use crate::error::HookError;
use crate::events::Dispatcher;
use async_trait::async_trait;

/// What a unit's hooks get to work with.
#[derive(Debug, Clone)]
pub struct UnitContext {
    /// Read-and-send view of the session's connection.
    pub bot: BotHandle,
    /// The session's dispatcher, for (un)subscribing handlers.
    pub dispatcher: Dispatcher,
    /// Process-wide handles (config, prefix, counters).
    pub host: HostContext,
}

/// An independently developed unit of behaviour (module or plugin).
///
/// Every hook defaults to a no-op. A unit's state lives in the registry
/// entry that owns it, and is dropped with the session.
#[async_trait]
pub trait Unit: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Whether the loader enables the unit when no override applies.
    fn enabled_by_default(&self) -> bool {
        true
    }

    /// One-time setup after registration.
    async fn init(&mut self, _ctx: &UnitContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Called on the disabled → enabled transition; typically subscribes handlers.
    async fn on_enable(&mut self, _ctx: &UnitContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Called on the enabled → disabled transition; typically unsubscribes.
    async fn on_disable(&mut self, _ctx: &UnitContext) -> Result<(), HookError> {
        Ok(())
    }
}
