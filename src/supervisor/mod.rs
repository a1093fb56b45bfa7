//! Connection supervisor.
//!
//! Owns the connection lifecycle: connect, wait for the ready signal, build
//! a [`Session`], and on termination or failure schedule a reconnect with a
//! capped exponential delay. Shutdown disables every unit, quits, ends the
//! connection and waits a short grace period before returning.
//!
//! ```text
//! Disconnected -> Connecting -> Ready -> Disconnected (reconnect)
//!                                     -> ShuttingDown
//! ```

mod backoff;
mod session;

pub use backoff::{BACKOFF_FACTOR, ReconnectPolicy};
pub use session::{Session, SessionEnd, Termination};

use crate::commands::Command;
use crate::context::HostContext;
use crate::error::ConnectionFailure;
use crate::events::{self, EventHandler};
use crate::registry::{Manifest, Unit};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};
use yunshen_link::event::LOGIN;
use yunshen_link::{Connection, Connector, EventStream, Link};

/// Supervisor lifecycle state, mirrored to the `connection_state` gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Disconnected,
    Connecting,
    Ready,
    ShuttingDown,
}

impl SupervisorState {
    pub fn gauge_value(self) -> i64 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Ready => 2,
            Self::ShuttingDown => 3,
        }
    }
}

/// Factories instantiated once per successful connection.
pub struct Manifests {
    pub modules: Manifest<Box<dyn Unit>>,
    pub plugins: Manifest<Box<dyn Unit>>,
    pub events: Manifest<Arc<dyn EventHandler>>,
    /// Extra commands on top of the built-in set.
    pub commands: Manifest<Arc<dyn Command>>,
}

impl Manifests {
    /// The bundled modules, plugins and event handlers.
    pub fn builtin() -> Self {
        Self {
            modules: crate::modules::module_manifest(),
            plugins: crate::modules::plugin_manifest(),
            events: events::builtin::manifest(),
            commands: Manifest::new(),
        }
    }

    /// Nothing beyond the command router and built-in commands.
    pub fn empty() -> Self {
        Self {
            modules: Manifest::new(),
            plugins: Manifest::new(),
            events: Manifest::new(),
            commands: Manifest::new(),
        }
    }
}

/// Cloneable control surface for a running [`Supervisor`].
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    shutdown: CancellationToken,
    state: watch::Receiver<SupervisorState>,
}

impl SupervisorHandle {
    /// Request a graceful shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Wait until the supervisor reports `state`. Returns `false` if the
    /// supervisor is gone first.
    pub async fn reached(&self, state: SupervisorState) -> bool {
        let mut rx = self.state.clone();
        rx.wait_for(|s| *s == state).await.is_ok()
    }
}

pub struct Supervisor {
    host: HostContext,
    connector: Arc<dyn Connector>,
    manifests: Arc<Manifests>,
    policy: ReconnectPolicy,
    attempts: u32,
    /// Pending reconnect. Replacing or clearing it cancels the old timer.
    timer: Option<Pin<Box<Sleep>>>,
    shutdown: CancellationToken,
    state: watch::Sender<SupervisorState>,
}

impl Supervisor {
    pub fn new(host: HostContext, connector: Arc<dyn Connector>, manifests: Manifests) -> Self {
        let policy = ReconnectPolicy::from_config(&host.config.bot);
        let (state, _) = watch::channel(SupervisorState::Disconnected);
        Self {
            host,
            connector,
            manifests: Arc::new(manifests),
            policy,
            attempts: 0,
            timer: None,
            shutdown: CancellationToken::new(),
            state,
        }
    }

    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            shutdown: self.shutdown.clone(),
            state: self.state.subscribe(),
        }
    }

    /// Consecutive failed attempts since the last ready connection.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn set_state(&self, state: SupervisorState) {
        crate::metrics::set_connection_state(state.gauge_value());
        self.state.send_replace(state);
    }

    /// Drive connections until shutdown.
    ///
    /// Returns an error only when a connection attempt fails with
    /// auto-reconnect disabled.
    pub async fn run(mut self) -> Result<(), ConnectionFailure> {
        let auto_reconnect = self.host.config.bot.auto_reconnect;

        loop {
            if let Some(timer) = self.timer.as_mut() {
                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => {}
                    _ = timer => {}
                }
                self.timer = None;
            }
            if self.shutdown.is_cancelled() {
                self.shutdown_session(None).await;
                return Ok(());
            }

            let session = match self.start().await {
                Ok(Some(session)) => session,
                Ok(None) => {
                    self.shutdown_session(None).await;
                    return Ok(());
                }
                Err(failure) => {
                    self.set_state(SupervisorState::Disconnected);
                    if auto_reconnect {
                        warn!(error = %failure, code = failure.error_code(), "connection attempt failed");
                        self.schedule_reconnect();
                        continue;
                    }
                    error!(error = %failure, code = failure.error_code(), "connection attempt failed, auto-reconnect disabled");
                    return Err(failure);
                }
            };

            let span = crate::telemetry::spans::session(&self.host.config.server.username, session.id());
            let mut session = session;
            match session.run(&self.shutdown).instrument(span).await {
                SessionEnd::Shutdown => {
                    self.shutdown_session(Some(session)).await;
                    return Ok(());
                }
                SessionEnd::Terminated(termination) => {
                    warn!(session = session.id(), cause = %termination.cause, reason = %termination.reason, "connection lost");
                    session.close(None).await;
                    self.set_state(SupervisorState::Disconnected);
                    if self.shutdown.is_cancelled() {
                        self.shutdown_session(None).await;
                        return Ok(());
                    }
                    if !auto_reconnect {
                        info!("auto-reconnect disabled, supervisor stopping");
                        return Ok(());
                    }
                    self.schedule_reconnect();
                }
            }
        }
    }

    /// Connect and wait for the ready signal.
    ///
    /// `Ok(None)` means shutdown was requested while connecting.
    async fn start(&mut self) -> Result<Option<Session>, ConnectionFailure> {
        self.set_state(SupervisorState::Connecting);
        let options = self.host.config.connect_options();
        let timeout = self.host.config.bot.ready_timeout();
        info!(
            host = %options.host,
            port = options.port,
            username = %options.username,
            auth = options.auth.as_str(),
            attempt = self.attempts,
            "connecting"
        );

        let attempt = establish(Arc::clone(&self.connector), options, timeout);
        let (connection, events) = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Ok(None),
            result = attempt => result?,
        };

        self.attempts = 0;
        let id = self.host.stats.session_started();
        let session = Session::open(id, connection, events, &self.host, &self.manifests).await;
        self.set_state(SupervisorState::Ready);
        Ok(Some(session))
    }

    /// Arm the reconnect timer for the next attempt.
    fn schedule_reconnect(&mut self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.timer = None;
        self.attempts = self.attempts.saturating_add(1);
        let delay = self.policy.delay_for(self.attempts);
        crate::metrics::record_reconnect();
        self.host.stats.reconnect_scheduled();
        info!(
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            "reconnect scheduled"
        );
        self.timer = Some(Box::pin(tokio::time::sleep(delay)));
    }

    async fn shutdown_session(&mut self, session: Option<Session>) {
        self.set_state(SupervisorState::ShuttingDown);
        self.timer = None;
        info!("shutting down");
        if let Some(session) = session {
            session.close(Some("shutting down")).await;
        }
        let grace: Duration = self.host.config.bot.shutdown_grace();
        tokio::time::sleep(grace).await;
        info!("shutdown complete");
    }
}

/// Connect, then wait for the ready signal. Both steps share one deadline.
async fn establish(
    connector: Arc<dyn Connector>,
    options: yunshen_link::ConnectOptions,
    timeout: Duration,
) -> Result<(Arc<dyn Connection>, EventStream), ConnectionFailure> {
    let deadline = Instant::now() + timeout;
    let Link {
        connection,
        mut events,
    } = tokio::time::timeout_at(deadline, connector.connect(&options))
        .await
        .map_err(|_| ConnectionFailure::ReadyTimeout(timeout))??;

    match tokio::time::timeout_at(deadline, wait_ready(&mut events)).await {
        Ok(Ok(())) => Ok((connection, events)),
        Ok(Err(reason)) => {
            connection.end();
            Err(ConnectionFailure::TerminatedEarly(reason))
        }
        Err(_) => {
            connection.end();
            Err(ConnectionFailure::ReadyTimeout(timeout))
        }
    }
}

/// Wait for `login`. Any termination event, or the stream closing, fails
/// the attempt with its reason.
async fn wait_ready(events: &mut EventStream) -> Result<(), String> {
    while let Some(event) = events.recv().await {
        if event.name == LOGIN {
            return Ok(());
        }
        if event.is_termination() {
            return Err(format!("{}: {}", event.name, event.describe_args()));
        }
        debug!(event = %event.name, "event before ready ignored");
    }
    Err("event stream closed".to_string())
}
