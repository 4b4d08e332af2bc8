//! wt-protocol: Wire framing for wterm terminal sessions
//!
//! This crate defines the binary framing used on the single full-duplex
//! connection between the terminal front end and the shell backend. Each
//! wire unit is one tag byte followed by an opaque payload; the tag selects
//! which logical channel (data, resize, control) the payload belongs to.

pub mod error;
pub mod frame;
pub mod geometry;

pub use error::ProtocolError;
pub use frame::{Frame, Tag, KEEPALIVE_TOKEN};
pub use geometry::{Geometry, CELL_HEIGHT_PX, CELL_WIDTH_PX};
