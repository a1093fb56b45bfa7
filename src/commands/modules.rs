//! `modules` - list, enable and disable units at runtime.

use super::{Command, CommandContext, CommandRouter};
use crate::error::{CommandError, CommandResult};
use async_trait::async_trait;

pub struct ModulesCommand;

#[async_trait]
impl Command for ModulesCommand {
    fn name(&self) -> &'static str {
        "modules"
    }

    fn description(&self) -> &'static str {
        "List modules and plugins, or enable/disable one"
    }

    fn usage(&self) -> &'static str {
        "modules [list | enable <name> | disable <name>]"
    }

    fn aliases(&self) -> Vec<&'static str> {
        vec!["mod"]
    }

    fn requires_operator(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &CommandContext<'_>, invoker: &str, argv: &[String]) -> CommandResult {
        let action = argv.first().map(|a| a.to_lowercase());
        match (action.as_deref(), argv.get(1)) {
            (None | Some("list"), None) => list(ctx).await,
            (Some(action @ ("enable" | "disable")), Some(name)) => {
                toggle(ctx, invoker, action == "enable", name).await
            }
            _ => Err(CommandError::Usage(self.usage().to_string())),
        }
    }
}

async fn list(ctx: &CommandContext<'_>) -> CommandResult {
    for registry in [&ctx.units.modules, &ctx.units.plugins] {
        let entries = registry
            .list()
            .into_iter()
            .map(|u| format!("{} [{}]", u.name, if u.enabled { "on" } else { "off" }))
            .collect::<Vec<_>>();
        let label = match registry.kind() {
            crate::registry::UnitKind::Module => "Modules",
            crate::registry::UnitKind::Plugin => "Plugins",
        };
        if entries.is_empty() {
            ctx.reply(format!("{label}: none")).await?;
        } else {
            ctx.reply(format!("{label}: {}", entries.join(", "))).await?;
        }
    }
    Ok(())
}

async fn toggle(ctx: &CommandContext<'_>, invoker: &str, enable: bool, name: &str) -> CommandResult {
    let Some((registry, key)) = ctx.units.find(name) else {
        return ctx.reply(format!("No such module or plugin: {name}")).await;
    };
    if !enable && key == CommandRouter::NAME {
        return ctx
            .reply(format!("{key} cannot be disabled from chat."))
            .await;
    }

    tracing::info!(invoker = %invoker, unit = %key, enable, "unit toggled from chat");
    let ok = if enable {
        registry.enable(&key).await?
    } else {
        registry.disable(&key).await?
    };
    let verb = if enable { "enable" } else { "disable" };
    if ok {
        ctx.reply(format!("{key}: {verb}d.")).await
    } else {
        ctx.reply(format!("{key}: {verb} failed, see the log.")).await
    }
}
