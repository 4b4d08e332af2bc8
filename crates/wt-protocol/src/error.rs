//! Protocol error types

use thiserror::Error;

/// Errors that can occur during framing operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Inbound message carried no tag byte
    #[error("Malformed frame: empty message, no tag byte")]
    MalformedFrame,

    /// Geometry payload could not be encoded or decoded as JSON
    #[error("Invalid geometry payload: {0}")]
    InvalidGeometry(#[from] serde_json::Error),
}
