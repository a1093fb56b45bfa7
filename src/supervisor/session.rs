//! One connected session: its dispatcher, unit registries and event loop.
//!
//! Everything here is built fresh when the connection reaches ready and is
//! dropped when it ends, so handlers registered in one session never leak
//! into the next.

use super::Manifests;
use crate::commands::{self, CommandRouter, CommandTable};
use crate::context::{BotHandle, HostContext};
use crate::error::DispatchError;
use crate::events::{Dispatcher, EventHandler};
use crate::registry::{Registry, UnitContext, Units};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use yunshen_link::event::{END, ERROR, KICKED};
use yunshen_link::{Connection, Event, EventStream};

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    /// `end`, `error`, `kicked`, or `closed` when the stream ran dry.
    pub cause: String,
    pub reason: String,
}

impl Termination {
    fn from_event(event: &Event) -> Self {
        Self {
            cause: event.name.clone(),
            reason: event.describe_args(),
        }
    }

    fn closed() -> Self {
        Self {
            cause: "closed".to_string(),
            reason: "event stream closed".to_string(),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            f.write_str(&self.cause)
        } else {
            write!(f, "{}: {}", self.cause, self.reason)
        }
    }
}

/// How [`Session::run`] returned.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Terminated(Termination),
    Shutdown,
}

/// Baseline handler for `end`, `error` and `kicked`: hands the termination
/// to the session loop, which decides about reconnecting.
struct TerminationWatch {
    tx: mpsc::UnboundedSender<Termination>,
}

#[async_trait]
impl EventHandler for TerminationWatch {
    fn name(&self) -> &str {
        "termination-watch"
    }

    async fn execute(&self, _bot: &BotHandle, event: &Event) -> Result<(), DispatchError> {
        // The loop may already be gone during teardown.
        let _ = self.tx.send(Termination::from_event(event));
        Ok(())
    }
}

pub struct Session {
    id: u64,
    connection: Arc<dyn Connection>,
    events: EventStream,
    bot: BotHandle,
    dispatcher: Dispatcher,
    units: Units,
    terminations: mpsc::UnboundedReceiver<Termination>,
}

impl Session {
    /// Wire up a ready connection: baseline handlers, the command router,
    /// then modules, plugins and event handlers from the manifests.
    pub async fn open(
        id: u64,
        connection: Arc<dyn Connection>,
        events: EventStream,
        host: &HostContext,
        manifests: &Manifests,
    ) -> Self {
        let dispatcher = Dispatcher::new();
        let (tx, terminations) = mpsc::unbounded_channel();
        for name in [END, ERROR, KICKED] {
            dispatcher.subscribe(name, Arc::new(TerminationWatch { tx: tx.clone() }));
        }

        let bot = BotHandle::new(Arc::clone(&connection));
        let ctx = UnitContext {
            bot: bot.clone(),
            dispatcher: dispatcher.clone(),
            host: host.clone(),
        };
        let units = Units {
            modules: Registry::modules(ctx.clone()),
            plugins: Registry::plugins(ctx, host.config.plugin_overrides()),
        };

        let table = Arc::new(CommandTable::new(host.prefix.clone()));
        table.load(&commands::builtin_manifest(), host);
        table.load(&manifests.commands, host);
        units
            .modules
            .register(Box::new(CommandRouter::new(table, units.clone())));
        if let Ok(false) = units.modules.enable(CommandRouter::NAME).await {
            warn!("command router failed to enable, chat commands unavailable");
        }

        units.modules.load(&manifests.modules).await;
        units.plugins.load(&manifests.plugins).await;
        let handlers = dispatcher.load(&manifests.events, host);

        info!(
            session = id,
            modules = units.modules.len(),
            plugins = units.plugins.len(),
            handlers,
            "session ready"
        );

        Self {
            id,
            connection,
            events,
            bot,
            dispatcher,
            units,
            terminations,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    /// Pull events one at a time and dispatch them until the connection
    /// terminates or `shutdown` fires.
    pub async fn run(&mut self, shutdown: &CancellationToken) -> SessionEnd {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return SessionEnd::Shutdown,
                Some(termination) = self.terminations.recv() => {
                    return SessionEnd::Terminated(termination);
                }
                event = self.events.recv() => match event {
                    Some(event) => {
                        self.dispatcher.dispatch(&self.bot, &event).await;
                    }
                    None => return SessionEnd::Terminated(Termination::closed()),
                },
            }
        }
    }

    /// Disable every unit, drop the session's subscriptions and registries,
    /// then close the connection (politely first when `quit` is given).
    pub async fn close(self, quit: Option<&str>) {
        self.units.disable_all().await;
        self.dispatcher.clear();
        self.units.clear();
        if let Some(reason) = quit {
            self.connection.quit(Some(reason)).await;
        }
        self.connection.end();
        debug!(session = self.id, "session closed");
    }
}
