//! The command router as a lifecycle unit.

use super::CommandTable;
use crate::context::{BotHandle, HostContext};
use crate::error::{DispatchError, HookError};
use crate::events::{EventHandler, SubscriptionId};
use crate::registry::{Unit, UnitContext, Units};
use async_trait::async_trait;
use std::sync::Arc;
use yunshen_link::Event;
use yunshen_link::event::CHAT;

/// Routes prefixed chat lines to commands while enabled.
pub struct CommandRouter {
    table: Arc<CommandTable>,
    units: Units,
    subscription: Option<SubscriptionId>,
}

impl CommandRouter {
    pub const NAME: &'static str = "CommandRouter";

    pub fn new(table: Arc<CommandTable>, units: Units) -> Self {
        Self {
            table,
            units,
            subscription: None,
        }
    }
}

#[async_trait]
impl Unit for CommandRouter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Routes chat commands"
    }

    async fn on_enable(&mut self, ctx: &UnitContext) -> Result<(), HookError> {
        let handler = RouteChat {
            table: Arc::clone(&self.table),
            units: self.units.clone(),
            host: ctx.host.clone(),
        };
        self.subscription = Some(ctx.dispatcher.subscribe(CHAT, Arc::new(handler)));
        tracing::info!(commands = self.table.len(), prefix = %self.table.prefix(), "command router enabled");
        Ok(())
    }

    async fn on_disable(&mut self, ctx: &UnitContext) -> Result<(), HookError> {
        if let Some(id) = self.subscription.take() {
            ctx.dispatcher.unsubscribe(id);
        }
        Ok(())
    }
}

struct RouteChat {
    table: Arc<CommandTable>,
    units: Units,
    host: HostContext,
}

#[async_trait]
impl EventHandler for RouteChat {
    fn name(&self) -> &str {
        "command-router"
    }

    async fn execute(&self, bot: &BotHandle, event: &Event) -> Result<(), DispatchError> {
        let speaker = event.arg_str(0).ok_or(DispatchError::BadArgument(0))?;
        let text = event.arg_str(1).ok_or(DispatchError::BadArgument(1))?;
        if bot.is_self(speaker) {
            return Ok(());
        }
        self.table
            .route(bot, &self.host, &self.units, speaker, text)
            .await;
        Ok(())
    }
}
