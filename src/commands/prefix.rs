//! `prefix` - show or change the command prefix.

use super::{Command, CommandContext};
use crate::error::{CommandError, CommandResult};
use async_trait::async_trait;

pub struct PrefixCommand;

#[async_trait]
impl Command for PrefixCommand {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn description(&self) -> &'static str {
        "Show or change the command prefix"
    }

    fn usage(&self) -> &'static str {
        "prefix [new-prefix]"
    }

    fn requires_operator(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &CommandContext<'_>, _invoker: &str, argv: &[String]) -> CommandResult {
        match argv {
            [] => ctx.reply(format!("Current prefix: {}", ctx.prefix())).await,
            [new] => {
                ctx.table.set_prefix(new.as_str());
                ctx.reply(format!("Prefix changed to {new}")).await
            }
            _ => Err(CommandError::Usage(self.usage().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Fixture;
    use crate::config::Config;

    #[tokio::test]
    async fn test_show_and_change() {
        let mut fx = Fixture::new(Config::default()).await;
        fx.say("Alice", "!prefix").await;
        assert_eq!(fx.server.next_chat().await.as_deref(), Some("Current prefix: !"));

        fx.say("Alice", "!prefix >>").await;
        assert_eq!(fx.server.next_chat().await.as_deref(), Some("Prefix changed to >>"));
        assert_eq!(fx.host.prefix.get(), ">>");

        fx.say("Alice", ">>prefix a b").await;
        assert_eq!(
            fx.server.next_chat().await.as_deref(),
            Some("Usage: >>prefix [new-prefix]")
        );
    }
}
