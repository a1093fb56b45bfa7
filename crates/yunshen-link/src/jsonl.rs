//! Newline-delimited JSON bridge to an external protocol sidecar.
//!
//! The sidecar speaks the game protocol and exposes it over a plain TCP
//! socket, one JSON document per line:
//!
//! - inbound: `{"event": "<name>", "args": [...]}`
//! - outbound: `{"op": "login" | "chat" | "quit", ...}`
//!
//! A `stats` event whose first argument is an object replaces the snapshot
//! returned by [`Connection::stats`].

use crate::connection::{AuthMode, ConnectOptions, Connection, Connector, Link, EVENT_QUEUE_CAPACITY};
use crate::{Event, LinkError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, warn};

/// Longest accepted line, in bytes.
///
/// A longer line from the sidecar is a protocol error: it is reported as an
/// `error` event and the connection stops reading, which ends the session.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Event name carrying a status snapshot object.
pub const STATS_EVENT: &str = "stats";

/// How long `quit` waits for its frame to reach the socket.
const QUIT_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Outbound frame.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Frame {
    Login {
        username: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        auth: AuthMode,
    },
    Chat {
        text: String,
    },
    Quit {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// A frame queued for the writer task, with an optional flush acknowledgement.
struct Outgoing {
    frame: Frame,
    flushed: Option<oneshot::Sender<()>>,
}

impl From<Frame> for Outgoing {
    fn from(frame: Frame) -> Self {
        Self {
            frame,
            flushed: None,
        }
    }
}

/// Connector for the JSON-lines sidecar.
#[derive(Debug, Clone)]
pub struct JsonLinesConnector {
    connect_timeout: Duration,
}

impl Default for JsonLinesConnector {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl JsonLinesConnector {
    /// Create a connector with the given TCP connect timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
        use socket2::{SockRef, TcpKeepalive};

        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));
        sock.set_tcp_keepalive(&keepalive)
    }
}

#[async_trait]
impl Connector for JsonLinesConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Link, LinkError> {
        let address = options.address();
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| LinkError::Refused(format!("timed out connecting to {address}")))??;

        if let Err(e) = Self::enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        let _ = stream.set_nodelay(true);

        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_LEN));
        let login = Frame::Login {
            username: options.username.clone(),
            password: options.password.as_ref().map(|p| p.to_string()),
            auth: options.auth,
        };
        framed
            .send(serde_json::to_string(&login)?)
            .await
            .map_err(codec_error)?;
        debug!(address = %address, username = %options.username, "login frame sent");

        let (mut sink, mut lines) = framed.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outgoing>();
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let stats = Arc::new(RwLock::new(Vec::new()));

        let writer = tokio::spawn(async move {
            while let Some(Outgoing { frame, flushed }) = out_rx.recv().await {
                let line = match serde_json::to_string(&frame) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "dropping unencodable frame");
                        continue;
                    }
                };
                if let Err(e) = sink.send(line).await {
                    debug!(error = %e, "sidecar write failed");
                    break;
                }
                if let Some(ack) = flushed {
                    let _ = ack.send(());
                }
            }
        });

        let reader_stats = Arc::clone(&stats);
        let reader = tokio::spawn(async move {
            loop {
                let event = match lines.next().await {
                    Some(Ok(line)) if line.trim().is_empty() => continue,
                    Some(Ok(line)) => match serde_json::from_str::<Event>(&line) {
                        Ok(event) => event,
                        Err(e) => {
                            warn!(error = %e, "ignoring malformed sidecar frame");
                            continue;
                        }
                    },
                    Some(Err(e)) => {
                        let _ = event_tx.send(Event::error(&e.to_string())).await;
                        break;
                    }
                    None => {
                        let _ = event_tx.send(Event::end("socket closed")).await;
                        break;
                    }
                };
                if event.name == STATS_EVENT {
                    if let Some(Value::Object(map)) = event.args.first() {
                        *reader_stats.write() = map
                            .iter()
                            .map(|(k, v)| (k.clone(), render(v)))
                            .collect();
                    }
                }
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        let connection = JsonLinesConnection {
            username: options.username.clone(),
            outbound: out_tx,
            stats,
            tasks: [writer.abort_handle(), reader.abort_handle()],
        };
        Ok(Link {
            connection: Arc::new(connection),
            events: event_rx,
        })
    }
}

fn codec_error(e: tokio_util::codec::LinesCodecError) -> LinkError {
    match e {
        tokio_util::codec::LinesCodecError::Io(io) => LinkError::Io(io),
        other => LinkError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, other)),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct JsonLinesConnection {
    username: String,
    outbound: mpsc::UnboundedSender<Outgoing>,
    stats: Arc<RwLock<Vec<(String, String)>>>,
    tasks: [AbortHandle; 2],
}

#[async_trait]
impl Connection for JsonLinesConnection {
    fn username(&self) -> &str {
        &self.username
    }

    async fn chat(&self, text: &str) -> Result<(), LinkError> {
        self.outbound
            .send(
                Frame::Chat {
                    text: text.to_string(),
                }
                .into(),
            )
            .map_err(|_| LinkError::Closed)
    }

    async fn quit(&self, reason: Option<&str>) {
        let (ack, flushed) = oneshot::channel();
        let queued = self.outbound.send(Outgoing {
            frame: Frame::Quit {
                reason: reason.map(str::to_string),
            },
            flushed: Some(ack),
        });
        // The writer must get the frame out before `end` aborts it.
        if queued.is_ok() && tokio::time::timeout(QUIT_FLUSH_TIMEOUT, flushed).await.is_err() {
            debug!("quit frame not flushed in time");
        }
    }

    fn end(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }

    fn stats(&self) -> Vec<(String, String)> {
        self.stats.read().clone()
    }
}

impl Drop for JsonLinesConnection {
    fn drop(&mut self) {
        self.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn login_chat_and_events_round_trip_through_sidecar() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let sidecar = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut read = BufReader::new(read).lines();

            let login: Value = serde_json::from_str(&read.next_line().await.unwrap().unwrap()).unwrap();
            assert_eq!(login["op"], "login");
            assert_eq!(login["username"], "YunShenBot");
            assert_eq!(login["auth"], "offline");
            assert!(login.get("password").is_none());

            write
                .write_all(b"{\"event\":\"login\"}\n\n{\"event\":\"stats\",\"args\":[{\"health\":20}]}\nnot json\n{\"event\":\"chat\",\"args\":[\"Alice\",\"hi\"]}\n")
                .await
                .unwrap();

            let chat: Value = serde_json::from_str(&read.next_line().await.unwrap().unwrap()).unwrap();
            assert_eq!(chat["op"], "chat");
            assert_eq!(chat["text"], "hello Alice");
        });

        let opts = ConnectOptions::offline("127.0.0.1", port, "YunShenBot");
        let mut link = JsonLinesConnector::default().connect(&opts).await.unwrap();

        assert_eq!(link.events.recv().await.unwrap().name, crate::event::LOGIN);
        assert_eq!(link.events.recv().await.unwrap().name, STATS_EVENT);
        let chat = link.events.recv().await.unwrap();
        assert_eq!(chat, Event::chat("Alice", "hi"));
        assert_eq!(
            link.connection.stats(),
            vec![("health".to_string(), "20".to_string())]
        );

        link.connection.chat("hello Alice").await.unwrap();
        sidecar.await.unwrap();

        // Sidecar closed its socket.
        let end = link.events.recv().await.unwrap();
        assert!(end.is_termination());
    }

    #[tokio::test]
    async fn oversized_line_ends_the_stream_with_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let sidecar = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut read = BufReader::new(read).lines();
            read.next_line().await.unwrap().unwrap();

            let mut oversized = vec![b'x'; MAX_FRAME_LEN + 1];
            oversized.push(b'\n');
            write.write_all(b"{\"event\":\"login\"}\n").await.unwrap();
            write.write_all(&oversized).await.unwrap();
            // Hold the socket open until the client hangs up.
            let _ = read.next_line().await;
        });

        let opts = ConnectOptions::offline("127.0.0.1", port, "bot");
        let mut link = JsonLinesConnector::default().connect(&opts).await.unwrap();

        assert_eq!(link.events.recv().await.unwrap().name, crate::event::LOGIN);
        let error = link.events.recv().await.unwrap();
        assert_eq!(error.name, crate::event::ERROR);
        assert!(error.is_termination());
        // The reader has stopped; nothing follows the error.
        assert!(link.events.recv().await.is_none());

        link.connection.end();
        sidecar.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let opts = ConnectOptions::offline("127.0.0.1", port, "bot");
        let err = JsonLinesConnector::default().connect(&opts).await.unwrap_err();
        assert!(matches!(err, LinkError::Io(_) | LinkError::Refused(_)));
    }

    #[test]
    fn frames_serialize_with_op_tag() {
        let quit = serde_json::to_string(&Frame::Quit { reason: None }).unwrap();
        assert_eq!(quit, r#"{"op":"quit"}"#);
        let login = serde_json::to_value(Frame::Login {
            username: "bot".into(),
            password: Some("pw".into()),
            auth: AuthMode::Microsoft,
        })
        .unwrap();
        assert_eq!(login["auth"], "microsoft");
        assert_eq!(login["password"], "pw");
    }
}
