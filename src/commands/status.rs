//! `status` - uptime, reconnects, units and client-reported stats.

use super::{Command, CommandContext};
use crate::error::CommandResult;
use async_trait::async_trait;

pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &'static str {
        "status"
    }

    fn description(&self) -> &'static str {
        "Show the bot's status"
    }

    fn usage(&self) -> &'static str {
        "status"
    }

    fn aliases(&self) -> Vec<&'static str> {
        vec!["stats", "info"]
    }

    async fn execute(&self, ctx: &CommandContext<'_>, _invoker: &str, _argv: &[String]) -> CommandResult {
        let stats = &ctx.host.stats;
        let units = ctx.units.list();
        let enabled = units.iter().filter(|(_, u)| u.enabled).count();

        ctx.reply("=== Bot status ===").await?;
        ctx.reply(format!("Username: {}", ctx.bot.username())).await?;
        ctx.reply(format!("Uptime: {}", stats.uptime())).await?;
        ctx.reply(format!(
            "Sessions: {}, reconnects: {}",
            stats.sessions(),
            stats.reconnects()
        ))
        .await?;
        ctx.reply(format!("Units enabled: {enabled}/{}", units.len()))
            .await?;
        for (key, value) in ctx.bot.stats() {
            ctx.reply(format!("{key}: {value}")).await?;
        }
        Ok(())
    }
}
