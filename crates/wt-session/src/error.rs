//! Session error types

use thiserror::Error;
use wt_protocol::ProtocolError;

/// Errors surfaced by session components
#[derive(Error, Debug)]
pub enum SessionError {
    /// Framing error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The transport could not deliver or accept data
    #[error("Transport error: {0}")]
    Transport(String),

    /// The emulator rejected a write or resize
    #[error("Emulator error: {0}")]
    Emulator(String),
}
