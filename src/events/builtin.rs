//! Event handlers loaded on every session.

use super::EventHandler;
use crate::context::{BotHandle, HostContext, SharedPrefix};
use crate::error::DispatchError;
use crate::registry::Manifest;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use yunshen_link::Event;
use yunshen_link::event::{CHAT, DEATH, SPAWN};

/// The stock event manifest: `chat`, `spawn` and `death`.
pub fn manifest() -> Manifest<Arc<dyn EventHandler>> {
    Manifest::new()
        .with(CHAT, |host: &HostContext| {
            Arc::new(ChatLog {
                prefix: host.prefix.clone(),
            }) as Arc<dyn EventHandler>
        })
        .with(SPAWN, |host: &HostContext| {
            Arc::new(SpawnAnnounce {
                prefix: host.prefix.clone(),
            }) as Arc<dyn EventHandler>
        })
        .with(DEATH, |_: &HostContext| Arc::new(DeathLog) as Arc<dyn EventHandler>)
}

/// Logs chat lines and answers when someone mentions the bot by name.
pub struct ChatLog {
    prefix: SharedPrefix,
}

#[async_trait]
impl EventHandler for ChatLog {
    fn name(&self) -> &str {
        "chat-log"
    }

    async fn execute(&self, bot: &BotHandle, event: &Event) -> Result<(), DispatchError> {
        let speaker = event.arg_str(0).ok_or(DispatchError::BadArgument(0))?;
        let text = event.arg_str(1).ok_or(DispatchError::BadArgument(1))?;
        if bot.is_self(speaker) {
            return Ok(());
        }
        info!(speaker = %speaker, "<{}> {}", speaker, text);

        let mentioned = text.to_lowercase().contains(&bot.username().to_lowercase());
        if mentioned && self.prefix.strip(text).is_none() {
            let prefix = self.prefix.get();
            bot.chat(&format!("{speaker}, hello! Type {prefix}help for help."))
                .await?;
        }
        Ok(())
    }
}

/// Announces the bot once it first enters the world.
pub struct SpawnAnnounce {
    prefix: SharedPrefix,
}

#[async_trait]
impl EventHandler for SpawnAnnounce {
    fn name(&self) -> &str {
        "spawn-announce"
    }

    fn once(&self) -> bool {
        true
    }

    async fn execute(&self, bot: &BotHandle, _event: &Event) -> Result<(), DispatchError> {
        info!(username = %bot.username(), "spawned");
        let prefix = self.prefix.get();
        bot.chat(&format!("YunShen Bot is online! Type {prefix}help for help."))
            .await?;
        Ok(())
    }
}

/// Logs deaths with the position when the client reports one.
pub struct DeathLog;

#[async_trait]
impl EventHandler for DeathLog {
    fn name(&self) -> &str {
        "death-log"
    }

    async fn execute(&self, bot: &BotHandle, event: &Event) -> Result<(), DispatchError> {
        match (event.arg_f64(0), event.arg_f64(1), event.arg_f64(2)) {
            (Some(x), Some(y), Some(z)) => {
                warn!(username = %bot.username(), x, y, z, "bot died")
            }
            _ => warn!(username = %bot.username(), "bot died"),
        }
        Ok(())
    }
}
