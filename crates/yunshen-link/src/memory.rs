//! In-process scripted connector.
//!
//! Each call to [`Connector::connect`] consumes the next queued [`Attempt`]
//! (accepting when the queue is empty). Accepted and silent attempts publish a
//! [`MemoryServer`] handle that plays the server side of the connection.

use crate::connection::{ConnectOptions, Connection, Connector, Link, EVENT_QUEUE_CAPACITY};
use crate::event::{self, Event};
use crate::LinkError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Behaviour of one scripted connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// Fail the connect call with [`LinkError::Refused`].
    Refuse(String),
    /// Open the transport but never send `login`.
    Silent,
    /// Open the transport and send `login` immediately.
    Accept,
}

/// Something the client sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A chat message.
    Chat(String),
    /// A graceful quit request.
    Quit(Option<String>),
}

/// Scripted connector; cheap to clone, clones share the script.
#[derive(Clone)]
pub struct MemoryConnector {
    inner: Arc<Inner>,
}

struct Inner {
    script: Mutex<VecDeque<Attempt>>,
    attempts: AtomicUsize,
    servers_tx: mpsc::UnboundedSender<MemoryServer>,
    servers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<MemoryServer>>,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    /// Create a connector with an empty script.
    pub fn new() -> Self {
        let (servers_tx, servers_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(VecDeque::new()),
                attempts: AtomicUsize::new(0),
                servers_tx,
                servers_rx: tokio::sync::Mutex::new(servers_rx),
            }),
        }
    }

    /// Create a connector with the given attempts queued.
    pub fn scripted(attempts: impl IntoIterator<Item = Attempt>) -> Self {
        let connector = Self::new();
        connector.inner.script.lock().extend(attempts);
        connector
    }

    /// Queue one more attempt.
    pub fn push(&self, attempt: Attempt) {
        self.inner.script.lock().push_back(attempt);
    }

    /// Number of connect calls made so far.
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Wait for the server side of the next opened connection.
    pub async fn next_server(&self) -> Option<MemoryServer> {
        self.inner.servers_rx.lock().await.recv().await
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Link, LinkError> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        let attempt = self
            .inner
            .script
            .lock()
            .pop_front()
            .unwrap_or(Attempt::Accept);

        if let Attempt::Refuse(reason) = attempt {
            return Err(LinkError::Refused(reason));
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let wire = Arc::new(Wire {
            events: Mutex::new(Some(event_tx.clone())),
            outbound: out_tx,
            ended: AtomicBool::new(false),
            stats: Mutex::new(Vec::new()),
        });

        if attempt == Attempt::Accept {
            event_tx
                .send(Event::bare(event::LOGIN))
                .await
                .map_err(|_| LinkError::Closed)?;
        }
        drop(event_tx);

        let server = MemoryServer {
            username: options.username.clone(),
            wire: Arc::clone(&wire),
            outbound: out_rx,
        };
        let _ = self.inner.servers_tx.send(server);

        Ok(Link {
            connection: Arc::new(MemoryConnection {
                username: options.username.clone(),
                wire,
            }),
            events: event_rx,
        })
    }
}

struct Wire {
    events: Mutex<Option<mpsc::Sender<Event>>>,
    outbound: mpsc::UnboundedSender<Outbound>,
    ended: AtomicBool,
    stats: Mutex<Vec<(String, String)>>,
}

impl Wire {
    fn close(&self) {
        self.ended.store(true, Ordering::SeqCst);
        self.events.lock().take();
    }
}

struct MemoryConnection {
    username: String,
    wire: Arc<Wire>,
}

#[async_trait]
impl Connection for MemoryConnection {
    fn username(&self) -> &str {
        &self.username
    }

    async fn chat(&self, text: &str) -> Result<(), LinkError> {
        if self.wire.ended.load(Ordering::SeqCst) {
            return Err(LinkError::Closed);
        }
        self.wire
            .outbound
            .send(Outbound::Chat(text.to_string()))
            .map_err(|_| LinkError::Closed)
    }

    async fn quit(&self, reason: Option<&str>) {
        let _ = self
            .wire
            .outbound
            .send(Outbound::Quit(reason.map(str::to_string)));
    }

    fn end(&self) {
        self.wire.close();
    }

    fn stats(&self) -> Vec<(String, String)> {
        self.wire.stats.lock().clone()
    }
}

/// Server side of one in-memory connection.
pub struct MemoryServer {
    username: String,
    wire: Arc<Wire>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl MemoryServer {
    /// Username the client logged in with.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Deliver an event to the client. Returns `false` once the connection is closed.
    pub async fn emit(&self, event: Event) -> bool {
        let sender = self.wire.events.lock().clone();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Deliver a chat line from `speaker`.
    pub async fn say(&self, speaker: &str, text: &str) -> bool {
        self.emit(Event::chat(speaker, text)).await
    }

    /// Send `end` and close the event stream, as a dropped socket would.
    pub async fn disconnect(&self, reason: &str) {
        self.emit(Event::end(reason)).await;
        self.wire.close();
    }

    /// Replace the status snapshot reported by the client.
    pub fn set_stats(&self, stats: Vec<(String, String)>) {
        *self.wire.stats.lock() = stats;
    }

    /// Whether the client called `end` (or the server disconnected).
    pub fn is_closed(&self) -> bool {
        self.wire.ended.load(Ordering::SeqCst)
    }

    /// Wait for the next thing the client sends.
    pub async fn next_outbound(&mut self) -> Option<Outbound> {
        self.outbound.recv().await
    }

    /// Wait for the next chat message, skipping other frames.
    pub async fn next_chat(&mut self) -> Option<String> {
        loop {
            match self.outbound.recv().await? {
                Outbound::Chat(text) => return Some(text),
                Outbound::Quit(_) => continue,
            }
        }
    }

    /// Drain everything sent so far without waiting.
    pub fn drain(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            out.push(frame);
        }
        out
    }
}

impl std::fmt::Debug for MemoryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryServer")
            .field("username", &self.username)
            .field("closed", &self.is_closed())
            .finish()
    }
}
