//! Chat command routing.
//!
//! A [`CommandTable`] holds the commands, their aliases and the live prefix.
//! The [`CommandRouter`] unit subscribes to `chat` while enabled and feeds
//! every line through [`CommandTable::route`].

mod help;
mod modules;
mod prefix;
mod router;
mod status;

pub use help::HelpCommand;
pub use modules::ModulesCommand;
pub use prefix::PrefixCommand;
pub use router::CommandRouter;
pub use status::StatusCommand;

use crate::context::{BotHandle, HostContext, SharedPrefix};
use crate::error::{CommandError, CommandResult};
use crate::registry::{Manifest, Units};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, debug, warn};

/// A chat command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Canonical lowercase name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Usage line without the prefix, e.g. `help [command]`.
    fn usage(&self) -> &'static str;

    /// Alternative names (e.g. `stats` for `status`).
    fn aliases(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Restrict to `bot.operators` when that list is non-empty.
    fn requires_operator(&self) -> bool {
        false
    }

    async fn execute(&self, ctx: &CommandContext<'_>, invoker: &str, argv: &[String])
    -> CommandResult;
}

/// What a running command can reach.
pub struct CommandContext<'a> {
    pub bot: &'a BotHandle,
    pub host: &'a HostContext,
    pub table: &'a CommandTable,
    pub units: &'a Units,
}

impl CommandContext<'_> {
    /// Send a chat reply.
    pub async fn reply(&self, text: impl AsRef<str>) -> CommandResult {
        self.bot.chat(text.as_ref()).await?;
        Ok(())
    }

    /// Current prefix.
    pub fn prefix(&self) -> String {
        self.table.prefix()
    }
}

/// How one chat line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Not a command (no prefix or empty name).
    Ignored,
    /// No command or alias matched.
    Unknown(String),
    /// Operator-only command from a non-operator.
    Denied(String),
    /// The command ran; `ok` is false when it failed or panicked.
    Executed { command: String, ok: bool },
}

/// Commands, aliases and the prefix.
pub struct CommandTable {
    commands: DashMap<String, Arc<dyn Command>>,
    aliases: DashMap<String, String>,
    prefix: SharedPrefix,
}

impl CommandTable {
    pub fn new(prefix: SharedPrefix) -> Self {
        Self {
            commands: DashMap::new(),
            aliases: DashMap::new(),
            prefix,
        }
    }

    /// Register a command and its aliases, overwriting earlier entries.
    pub fn register(&self, command: Arc<dyn Command>) {
        let name = command.name().to_lowercase();
        for alias in command.aliases() {
            self.aliases.insert(alias.to_lowercase(), name.clone());
        }
        if self.commands.insert(name.clone(), command).is_some() {
            warn!(command = %name, "command already registered, overwriting");
        } else {
            debug!(command = %name, "command registered");
        }
    }

    /// Register every command in `manifest`; returns how many were added.
    pub fn load(&self, manifest: &Manifest<Arc<dyn Command>>, host: &HostContext) -> usize {
        let mut loaded = 0;
        for entry in manifest.iter() {
            match entry.build(host) {
                Ok(command) if command.name().trim().is_empty() => {
                    warn!(source = entry.source(), "skipping command with an empty name");
                }
                Ok(command) => {
                    self.register(command);
                    loaded += 1;
                }
                Err(e) => warn!(source = entry.source(), error = %e, "skipping command"),
            }
        }
        loaded
    }

    /// Case-insensitive lookup: direct name first, then alias.
    pub fn resolve(&self, token: &str) -> Option<Arc<dyn Command>> {
        let token = token.to_lowercase();
        if let Some(command) = self.commands.get(&token) {
            return Some(Arc::clone(command.value()));
        }
        let target = self.aliases.get(&token)?.value().clone();
        self.commands.get(&target).map(|c| Arc::clone(c.value()))
    }

    /// Every command, sorted by name.
    pub fn commands(&self) -> Vec<Arc<dyn Command>> {
        let mut all: Vec<_> = self.commands.iter().map(|c| Arc::clone(c.value())).collect();
        all.sort_by_key(|c| c.name());
        all
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn prefix(&self) -> String {
        self.prefix.get()
    }

    /// Change the prefix; applies to the next inbound message.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        tracing::info!(prefix = %prefix, "command prefix changed");
        self.prefix.set(prefix);
    }

    /// Split a prefixed line into a lowercased command name and its argv.
    pub fn parse(&self, text: &str) -> Option<(String, Vec<String>)> {
        let rest = self.prefix.strip(text)?;
        let mut tokens = rest.split_whitespace();
        let name = tokens.next()?.to_lowercase();
        Some((name, tokens.map(str::to_string).collect()))
    }

    /// Handle one chat line from `speaker`.
    ///
    /// The caller filters out the bot's own lines.
    pub async fn route(
        &self,
        bot: &BotHandle,
        host: &HostContext,
        units: &Units,
        speaker: &str,
        text: &str,
    ) -> Routed {
        let Some((name, argv)) = self.parse(text) else {
            return Routed::Ignored;
        };
        let prefix = self.prefix();

        let Some(command) = self.resolve(&name) else {
            debug!(invoker = %speaker, command = %name, "unknown command");
            if let Err(e) = bot
                .chat(&format!("Unknown command: {name}. Type {prefix}help for help."))
                .await
            {
                warn!(error = %e, "failed to send unknown-command reply");
            }
            return Routed::Unknown(name);
        };
        let canonical = command.name();

        if command.requires_operator() && !host.config.bot.is_operator(speaker) {
            warn!(invoker = %speaker, command = canonical, "operator-only command denied");
            if let Err(e) = bot
                .chat(&format!("{speaker}, you are not allowed to use {prefix}{canonical}."))
                .await
            {
                warn!(error = %e, "failed to send denial reply");
            }
            return Routed::Denied(canonical.to_string());
        }

        let ctx = CommandContext {
            bot,
            host,
            table: self,
            units,
        };
        let span = crate::telemetry::spans::command(canonical, speaker);
        let outcome = async {
            let _timer = crate::telemetry::CommandTimer::new(canonical);
            AssertUnwindSafe(command.execute(&ctx, speaker, &argv))
                .catch_unwind()
                .await
                .unwrap_or(Err(CommandError::Panicked))
        }
        .instrument(span)
        .await;

        let ok = match outcome {
            Ok(()) => {
                debug!(invoker = %speaker, command = canonical, args = ?argv, "command executed");
                true
            }
            Err(e) => {
                crate::metrics::record_command_error(canonical, e.error_code());
                warn!(invoker = %speaker, command = canonical, error = %e, "command failed");
                let reply = match &e {
                    CommandError::Usage(usage) => format!("Usage: {prefix}{usage}"),
                    _ => format!("Command {canonical} failed."),
                };
                if let Err(e) = bot.chat(&reply).await {
                    warn!(error = %e, "failed to send failure reply");
                }
                false
            }
        };
        Routed::Executed {
            command: canonical.to_string(),
            ok,
        }
    }
}

impl std::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.commands.len())
            .field("aliases", &self.aliases.len())
            .field("prefix", &self.prefix())
            .finish()
    }
}

/// The stock commands: `help`, `status`, `modules` and `prefix`.
pub fn builtin_manifest() -> Manifest<Arc<dyn Command>> {
    Manifest::new()
        .with("help", |_: &HostContext| Arc::new(HelpCommand) as Arc<dyn Command>)
        .with("status", |_: &HostContext| Arc::new(StatusCommand) as Arc<dyn Command>)
        .with("modules", |_: &HostContext| Arc::new(ModulesCommand) as Arc<dyn Command>)
        .with("prefix", |_: &HostContext| Arc::new(PrefixCommand) as Arc<dyn Command>)
}
