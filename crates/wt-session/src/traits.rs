//! Collaborator traits
//!
//! The controller never talks to a socket or a screen directly. The
//! transport and the emulator are capabilities handed in at construction;
//! their event sides arrive as ordered streams over channels, so detaching
//! a subscription is dropping a receiver, with no handler fields mutated on
//! foreign objects.

use async_trait::async_trait;
use bytes::Bytes;
use wt_protocol::Geometry;

use crate::error::SessionError;

/// Events emitted by the transport, delivered in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection finished its handshake and is ready for traffic
    Opened,
    /// A binary message arrived
    Binary(Bytes),
    /// A text message arrived; not a protocol violation, but an anomaly
    Text(String),
    /// The transport reported a failure
    Error(String),
    /// The connection closed, either end may have initiated
    Closed,
}

/// Outbound half of the duplex channel, owned by the transport collaborator
///
/// `send` is fire-and-forget: the transport owns backpressure, and nothing
/// in the session core waits synchronously for a reply.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send one binary message
    async fn send(&self, payload: Bytes) -> Result<(), SessionError>;

    /// Close the connection
    async fn close(&self) -> Result<(), SessionError>;
}

/// Events raised by the terminal emulator, delivered in the order raised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorEvent {
    /// User input (keystrokes) as UTF-8 text
    Data(String),
    /// The emulator adopted a new geometry
    Resize(Geometry),
}

/// Rendering surface owned by the emulator collaborator
#[async_trait]
pub trait Emulator: Send + Sync {
    /// Write text verbatim to the terminal output
    async fn write(&self, text: &str) -> Result<(), SessionError>;

    /// Write a line followed by a newline, for user-visible notices
    async fn write_line(&self, text: &str) -> Result<(), SessionError>;

    /// Apply a new geometry to the emulator
    async fn resize(&self, geometry: Geometry) -> Result<(), SessionError>;
}
