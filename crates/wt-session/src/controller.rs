//! Session controller
//!
//! Drives the lifecycle state machine `Connecting -> Open -> Closed` for
//! one connection bound to one emulator. All work happens on a single event
//! loop: connection events, emulator events, and keepalive ticks are
//! handled one at a time, in order per source, with no locks and no
//! buffering added on top of the transport's in-order delivery.
//!
//! `Closed` is terminal. There is no reconnection here; a new session must
//! be constructed for a new attempt.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use wt_protocol::{Frame, Geometry, Tag, KEEPALIVE_TOKEN};

use crate::keepalive::{KeepaliveTimer, KEEPALIVE_INTERVAL};
use crate::traits::{Connection, ConnectionEvent, Emulator, EmulatorEvent};

/// Capacity of the internal keepalive tick channel.
///
/// One is enough: ticks arrive minutes apart and a tick queued behind a
/// slow handler still produces its ping when drained.
const TICK_CHANNEL_CAPACITY: usize = 1;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the transport's connection-established signal
    Connecting,
    /// Ready for terminal I/O, keepalive running
    Open,
    /// Torn down; terminal state, timer cancelled
    Closed,
}

/// Tunables for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between keepalive pings
    pub keepalive_interval: Duration,
    /// Geometry assumed before the first resize event
    pub initial_geometry: Geometry,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: KEEPALIVE_INTERVAL,
            initial_geometry: Geometry::fallback(),
        }
    }
}

/// Which notice to surface when the session tears down
enum CloseNotice {
    /// The session reached `Open` and then ended
    Terminated,
    /// The transport failed before the session ever opened
    Refused,
}

/// Owns the connection and emulator handles for one session and routes
/// frames between them
pub struct SessionController<C: Connection, E: Emulator> {
    connection: C,
    emulator: E,
    state: SessionState,
    /// Last geometry sent, used to suppress redundant RESIZE frames
    geometry: Geometry,
    keepalive: KeepaliveTimer,
    config: SessionConfig,
}

impl<C: Connection, E: Emulator> SessionController<C, E> {
    /// Create a controller in the `Connecting` state
    pub fn new(connection: C, emulator: E, config: SessionConfig) -> Self {
        let geometry = config.initial_geometry;
        Self {
            connection,
            emulator,
            state: SessionState::Connecting,
            geometry,
            keepalive: KeepaliveTimer::new(),
            config,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion
    ///
    /// Consumes events from both collaborators until the transport signals
    /// close or error. Every exit path lands in `Closed` with the keepalive
    /// timer cancelled; failures never escape as panics or errors.
    pub async fn run(
        mut self,
        mut connection_events: mpsc::Receiver<ConnectionEvent>,
        mut emulator_events: mpsc::Receiver<EmulatorEvent>,
    ) -> SessionState {
        let (tick_tx, mut tick_rx) = mpsc::channel(TICK_CHANNEL_CAPACITY);
        let mut emulator_attached = true;

        while self.state != SessionState::Closed {
            tokio::select! {
                event = connection_events.recv() => match event {
                    Some(event) => self.on_connection_event(event, &tick_tx).await,
                    // Transport dropped its event side without a close signal
                    None => self.on_connection_event(ConnectionEvent::Closed, &tick_tx).await,
                },
                event = emulator_events.recv(), if emulator_attached => match event {
                    Some(event) => self.on_emulator_event(event).await,
                    None => emulator_attached = false,
                },
                Some(()) = tick_rx.recv() => self.on_keepalive_tick().await,
            }
        }

        self.state
    }

    async fn on_connection_event(&mut self, event: ConnectionEvent, ticks: &mpsc::Sender<()>) {
        match event {
            ConnectionEvent::Opened => self.on_opened(ticks),
            ConnectionEvent::Binary(payload) => self.on_inbound_frame(payload).await,
            ConnectionEvent::Text(text) => {
                // Not a protocol violation on its own, but nothing we can
                // frame-decode either
                tracing::warn!(len = text.len(), "Ignoring non-binary message");
            }
            ConnectionEvent::Error(info) => self.on_transport_error(info).await,
            ConnectionEvent::Closed => self.on_transport_closed().await,
        }
    }

    fn on_opened(&mut self, ticks: &mpsc::Sender<()>) {
        if self.state != SessionState::Connecting {
            tracing::warn!(state = ?self.state, "Duplicate open signal ignored");
            return;
        }
        self.state = SessionState::Open;
        self.keepalive
            .start(self.config.keepalive_interval, ticks.clone());
        tracing::info!("Session open");
    }

    async fn on_inbound_frame(&mut self, payload: Bytes) {
        if self.state != SessionState::Open {
            tracing::trace!(state = ?self.state, "Dropping inbound frame");
            return;
        }

        let frame = match Frame::decode(&payload) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping frame: {}", e);
                return;
            }
        };

        match Tag::from_u8(frame.tag) {
            Some(Tag::Data) => {
                let text = String::from_utf8_lossy(&frame.payload);
                if let Err(e) = self.emulator.write(&text).await {
                    tracing::warn!("Emulator write failed: {}", e);
                }
            }
            Some(Tag::Control) => {
                // Out-of-band traffic stays invisible to the user
                tracing::debug!(
                    payload = %String::from_utf8_lossy(&frame.payload),
                    "Control frame received"
                );
            }
            // RESIZE is client-to-server only; anything else is a tag from
            // a newer peer and must not crash us
            Some(Tag::Resize) | None => {
                tracing::trace!(tag = frame.tag, "Ignoring frame");
            }
        }
    }

    async fn on_emulator_event(&mut self, event: EmulatorEvent) {
        if self.state != SessionState::Open {
            tracing::trace!(state = ?self.state, "Dropping emulator event");
            return;
        }

        match event {
            EmulatorEvent::Data(text) => {
                self.send_frame(Frame::data(&text)).await;
            }
            EmulatorEvent::Resize(geometry) => {
                if geometry == self.geometry {
                    tracing::trace!(%geometry, "Geometry unchanged, no resize sent");
                    return;
                }
                let frame = match Frame::resize(geometry) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!("Dropping resize event: {}", e);
                        return;
                    }
                };
                self.send_frame(frame).await;
                if self.state == SessionState::Open {
                    self.geometry = geometry;
                }
            }
        }
    }

    async fn on_keepalive_tick(&mut self) {
        if self.state != SessionState::Open {
            return;
        }
        tracing::debug!("Sending keepalive ping");
        self.send_frame(Frame::control(KEEPALIVE_TOKEN)).await;
    }

    async fn on_transport_error(&mut self, info: String) {
        match self.state {
            SessionState::Connecting => {
                tracing::warn!("Connection failed before open: {}", info);
                self.enter_closed(CloseNotice::Refused).await;
            }
            SessionState::Open => {
                tracing::warn!("Transport error: {}", info);
                self.enter_closed(CloseNotice::Terminated).await;
            }
            SessionState::Closed => {}
        }
    }

    async fn on_transport_closed(&mut self) {
        match self.state {
            SessionState::Connecting => {
                tracing::warn!("Connection closed before open");
                self.enter_closed(CloseNotice::Refused).await;
            }
            SessionState::Open => {
                tracing::info!("Connection closed");
                self.enter_closed(CloseNotice::Terminated).await;
            }
            SessionState::Closed => {}
        }
    }

    /// Send one frame, tearing the session down if the transport rejects it
    async fn send_frame(&mut self, frame: Frame) {
        if let Err(e) = self.connection.send(frame.encode()).await {
            tracing::warn!("Transport send failed: {}", e);
            self.enter_closed(CloseNotice::Terminated).await;
        }
    }

    /// Transition to `Closed`: cancel the keepalive and surface a notice
    /// distinguishing a refused connection from a terminated session
    async fn enter_closed(&mut self, notice: CloseNotice) {
        self.keepalive.cancel();
        self.state = SessionState::Closed;

        let result = match notice {
            CloseNotice::Terminated => {
                let _ = self.emulator.write_line("").await;
                self.emulator.write_line("Session terminated!").await
            }
            CloseNotice::Refused => self.emulator.write_line("Connection refused!").await,
        };
        if let Err(e) = result {
            tracing::warn!("Could not surface close notice: {}", e);
        }
    }
}
