//! `help` - list commands or describe one.

use super::{Command, CommandContext};
use crate::error::CommandResult;
use async_trait::async_trait;

/// Commands per line in the overview.
const GROUP_SIZE: usize = 5;

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "List the available commands, or show help for one"
    }

    fn usage(&self) -> &'static str {
        "help [command]"
    }

    fn aliases(&self) -> Vec<&'static str> {
        vec!["?", "commands"]
    }

    async fn execute(&self, ctx: &CommandContext<'_>, _invoker: &str, argv: &[String]) -> CommandResult {
        let prefix = ctx.prefix();

        if let Some(wanted) = argv.first() {
            let Some(command) = ctx.table.resolve(wanted) else {
                return ctx.reply(format!("No such command: {}", wanted.to_lowercase())).await;
            };
            ctx.reply(format!("Command: {}", command.name())).await?;
            ctx.reply(format!("Description: {}", command.description())).await?;
            ctx.reply(format!("Usage: {prefix}{}", command.usage())).await?;
            let aliases = command.aliases();
            if !aliases.is_empty() {
                ctx.reply(format!("Aliases: {}", aliases.join(", "))).await?;
            }
            return Ok(());
        }

        let commands = ctx.table.commands();
        ctx.reply(format!("=== Available commands ({}) ===", commands.len()))
            .await?;
        for group in commands.chunks(GROUP_SIZE) {
            let line = group
                .iter()
                .map(|c| format!("{prefix}{}", c.name()))
                .collect::<Vec<_>>()
                .join(", ");
            ctx.reply(line).await?;
        }
        ctx.reply(format!("Type {prefix}help <command> for details."))
            .await
    }
}
