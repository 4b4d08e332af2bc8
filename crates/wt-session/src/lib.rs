//! wt-session: session lifecycle and frame routing for wterm
//!
//! A session binds one connection to one terminal emulator for its whole
//! life: `Connecting -> Open -> Closed`, no reconnection. The controller
//! owns the lifecycle state machine, routes decoded frames to the emulator,
//! and schedules the periodic keepalive that holds idle connections open.

pub mod controller;
pub mod debounce;
pub mod error;
pub mod keepalive;
pub mod traits;

pub use controller::{SessionConfig, SessionController, SessionState};
pub use debounce::{debounce_resize, RESIZE_DEBOUNCE};
pub use error::SessionError;
pub use keepalive::{KeepaliveTimer, KEEPALIVE_INTERVAL};
pub use traits::{Connection, ConnectionEvent, Emulator, EmulatorEvent};
