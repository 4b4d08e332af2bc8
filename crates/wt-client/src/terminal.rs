//! Local terminal emulator adapter
//!
//! Uses the terminal the client runs in as the rendering surface: raw-mode
//! stdin bytes become input events, SIGWINCH becomes coalesced geometry
//! events, and session output goes straight to stdout.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use wt_protocol::Geometry;
use wt_session::{Emulator, EmulatorEvent, SessionError};

const INPUT_BUF_SIZE: usize = 1024;

/// Terminal emulator backed by the process's own tty
///
/// Construction switches the terminal into raw mode; dropping the adapter
/// restores it.
pub struct StdioTerminal {
    _raw: RawModeGuard,
}

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            tracing::warn!("Could not leave raw mode: {}", e);
        }
    }
}

impl StdioTerminal {
    pub fn new() -> anyhow::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self {
            _raw: RawModeGuard,
        })
    }
}

#[async_trait]
impl Emulator for StdioTerminal {
    async fn write(&self, text: &str) -> Result<(), SessionError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| SessionError::Emulator(e.to_string()))
    }

    async fn write_line(&self, text: &str) -> Result<(), SessionError> {
        // Raw mode needs an explicit carriage return
        self.write(&format!("{}\r\n", text)).await
    }

    async fn resize(&self, geometry: Geometry) -> Result<(), SessionError> {
        // The user's own terminal decides its size; nothing to apply
        tracing::trace!(%geometry, "Resize request ignored for local tty");
        Ok(())
    }
}

/// Current tty geometry, falling back to the protocol default
pub fn current_geometry() -> Geometry {
    crossterm::terminal::size()
        .map(|(cols, rows)| Geometry::new(cols, rows))
        .unwrap_or_default()
}

/// Forward raw-mode stdin bytes as input events
pub fn spawn_input_pump(events: mpsc::Sender<EmulatorEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let mut buf = [0u8; INPUT_BUF_SIZE];
        loop {
            match stdin.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                    if events.send(EmulatorEvent::Data(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("stdin read failed: {}", e);
                    break;
                }
            }
        }
    })
}

/// Forward window-change signals as coalesced resize events
///
/// Emits the current geometry once at startup so the backend learns the
/// real dimensions, then one event per burst of SIGWINCH signals.
#[cfg(unix)]
pub fn spawn_resize_pump(events: mpsc::Sender<EmulatorEvent>) -> JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};
    use wt_session::{debounce_resize, RESIZE_DEBOUNCE};

    tokio::spawn(async move {
        let (raw_tx, raw_rx) = mpsc::channel(16);
        let mut debounced = debounce_resize(raw_rx, RESIZE_DEBOUNCE);

        let forward = tokio::spawn(async move {
            while let Some(geometry) = debounced.recv().await {
                if events.send(EmulatorEvent::Resize(geometry)).await.is_err() {
                    break;
                }
            }
        });

        let mut winch = match signal(SignalKind::window_change()) {
            Ok(winch) => winch,
            Err(e) => {
                tracing::warn!("Could not watch SIGWINCH: {}", e);
                return;
            }
        };

        let _ = raw_tx.send(current_geometry()).await;
        while winch.recv().await.is_some() {
            let _ = raw_tx.send(current_geometry()).await;
        }

        drop(raw_tx);
        let _ = forward.await;
    })
}

#[cfg(not(unix))]
pub fn spawn_resize_pump(events: mpsc::Sender<EmulatorEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        // No resize signal on this platform; report the startup geometry only
        let _ = events.send(EmulatorEvent::Resize(current_geometry())).await;
    })
}
