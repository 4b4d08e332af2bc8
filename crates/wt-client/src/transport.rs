//! WebSocket transport adapter
//!
//! Bridges a tokio-tungstenite socket to the session's `Connection` trait.
//! A single transport task owns the socket; the `Connection` half talks to
//! it over a command channel, and socket activity comes back as an ordered
//! `ConnectionEvent` stream.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use wt_session::{Connection, ConnectionEvent, SessionError};

/// Buffer between the session and the transport task
const CHANNEL_CAPACITY: usize = 64;

enum Command {
    Send(Bytes),
    Close,
}

/// Outbound half of a WebSocket connection
pub struct WsConnection {
    commands: mpsc::Sender<Command>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&self, payload: Bytes) -> Result<(), SessionError> {
        self.commands
            .send(Command::Send(payload))
            .await
            .map_err(|_| SessionError::Transport("transport task is gone".into()))
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::Close)
            .await
            .map_err(|_| SessionError::Transport("transport task is gone".into()))
    }
}

/// Start connecting to `url`
///
/// Returns immediately; the handshake outcome arrives on the event stream
/// as `Opened` or `Error`, so the session observes a refused connection the
/// same way it observes any later transport failure.
pub fn connect(url: String) -> (WsConnection, mpsc::Receiver<ConnectionEvent>) {
    let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(run_transport(url, cmd_rx, event_tx));
    (WsConnection { commands: cmd_tx }, event_rx)
}

async fn run_transport(
    url: String,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::Sender<ConnectionEvent>,
) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!("WebSocket handshake failed: {}", e);
            let _ = events.send(ConnectionEvent::Error(e.to_string())).await;
            return;
        }
    };
    tracing::debug!(%url, "WebSocket connected");
    if events.send(ConnectionEvent::Opened).await.is_err() {
        return;
    }

    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            message = source.next() => {
                let event = match message {
                    Some(Ok(Message::Binary(data))) => ConnectionEvent::Binary(Bytes::from(data)),
                    Some(Ok(Message::Text(text))) => ConnectionEvent::Text(text),
                    Some(Ok(Message::Close(_))) | None => ConnectionEvent::Closed,
                    // Transport-level frames, not session traffic
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => ConnectionEvent::Error(e.to_string()),
                };
                let terminal = !matches!(event, ConnectionEvent::Binary(_) | ConnectionEvent::Text(_));
                let _ = events.send(event).await;
                if terminal {
                    break;
                }
            }
            command = commands.recv() => match command {
                Some(Command::Send(payload)) => {
                    if let Err(e) = sink.send(Message::Binary(payload.to_vec())).await {
                        tracing::warn!("WebSocket send failed: {}", e);
                        let _ = events.send(ConnectionEvent::Error(e.to_string())).await;
                        break;
                    }
                }
                Some(Command::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    let _ = events.send(ConnectionEvent::Closed).await;
                    break;
                }
            }
        }
    }
}
