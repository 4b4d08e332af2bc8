//! Keepalive timer ownership
//!
//! The timer is the single long-lived background activity of a session.
//! Invariant: the timer is running iff the session state is `Open`; every
//! path into `Closed` must cancel it exactly once.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Interval between keepalive pings; well under typical idle timeouts
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(9 * 60);

/// Handle to the periodic keepalive task, exclusively owned by the
/// session controller
#[derive(Debug, Default)]
pub struct KeepaliveTimer {
    handle: Option<JoinHandle<()>>,
}

impl KeepaliveTimer {
    /// Create a timer that is not yet running
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Start ticking, delivering one unit per elapsed interval
    ///
    /// Ticks are delivered into the session event loop rather than sending
    /// frames from the timer task, so keepalive frames go out from the same
    /// single-threaded handler as everything else. Starting an already
    /// running timer restarts it.
    pub fn start(&mut self, interval: Duration, ticks: mpsc::Sender<()>) {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if ticks.send(()).await.is_err() {
                    // Event loop is gone, nothing left to keep alive
                    break;
                }
            }
        }));
    }

    /// Stop the timer; a no-op when never started or already cancelled
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Keepalive timer cancelled");
        }
    }

    /// Whether the timer task is currently alive
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for KeepaliveTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
