//! Resize coalescing
//!
//! A drag-resize raises a burst of geometry signals. The session should see
//! one coalesced geometry-change event per burst, carrying the last value
//! observed within the window, so a drag emits one RESIZE frame rather than
//! a stream of them.

use std::time::Duration;

use tokio::sync::mpsc;
use wt_protocol::Geometry;

/// Window within which consecutive resize signals are folded together
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Wrap a raw stream of geometry signals into a debounced one
///
/// Forwards the latest geometry of each burst once `window` elapses with no
/// further signal. Closing the raw sender flushes any pending geometry and
/// then closes the returned receiver.
pub fn debounce_resize(
    mut raw: mpsc::Receiver<Geometry>,
    window: Duration,
) -> mpsc::Receiver<Geometry> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        while let Some(mut latest) = raw.recv().await {
            loop {
                match tokio::time::timeout(window, raw.recv()).await {
                    // Still dragging, keep only the newest value
                    Ok(Some(next)) => latest = next,
                    Ok(None) => {
                        let _ = tx.send(latest).await;
                        return;
                    }
                    Err(_) => break,
                }
            }
            if tx.send(latest).await.is_err() {
                return;
            }
        }
    });
    rx
}
