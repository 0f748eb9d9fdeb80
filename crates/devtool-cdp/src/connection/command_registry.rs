//! Correlates sent commands with their eventual responses.
//!
//! `CommandRegistry` is pure bookkeeping: it hands out monotonically
//! increasing ids, holds a one-shot completion slot per in-flight id, and
//! resolves or cancels that slot when the receive loop or a timeout decides
//! the command is done. It never touches the WebSocket itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{oneshot, Mutex};

use crate::error::CdpError;
use crate::transport::CdpResponse;

/// Pending-command table for one [`crate::Connection`].
///
/// A command id is unique per connection and strictly increasing (spec
/// invariant: "a command id is unique per Connection and strictly
/// increasing"). Every id inserted here is eventually removed by exactly one
/// of [`CommandRegistry::resolve`] or [`CommandRegistry::cancel`] — never
/// both, never neither.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>,
}

impl CommandRegistry {
    /// Build an empty registry whose first assigned id is 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve the next id and register a completion slot for it.
    ///
    /// Returns the assigned id and the receiving half of the slot; the
    /// caller awaits the receiver (with its own timeout) while the sending
    /// half is later consumed by [`CommandRegistry::resolve`].
    pub async fn create(&self) -> (u64, oneshot::Receiver<CdpResponse>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);
        (id, rx)
    }

    /// Complete the pending slot for `response.id`, if one exists.
    ///
    /// Returns `true` if a waiter was found (and thus notified). A `false`
    /// result means the response arrived for an id nobody is waiting on
    /// anymore — typically because it timed out already — and is not an
    /// error; the late response is simply dropped.
    pub async fn resolve(&self, response: CdpResponse) -> bool {
        if let Some(tx) = self.pending.lock().await.remove(&response.id) {
            let _ = tx.send(response);
            true
        } else {
            false
        }
    }

    /// Remove the pending slot for `id` without resolving it.
    ///
    /// Used on timeout (the caller already observed [`CdpError::Timeout`])
    /// and on connection loss (every remaining id is cancelled so its
    /// receiver observes a dropped sender and the caller maps that to
    /// [`CdpError::ConnectionClosed`]).
    pub async fn cancel(&self, id: u64) {
        self.pending.lock().await.remove(&id);
    }

    /// Cancel every pending command, e.g. because the socket closed.
    ///
    /// Dropping each sender causes the corresponding receiver to resolve to
    /// an error the next time it's polled.
    pub async fn cancel_all(&self) {
        self.pending.lock().await.clear();
    }

    /// Number of commands currently awaiting a response.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Map a dropped/cancelled command slot to the appropriate error.
pub fn slot_closed_error() -> CdpError {
    CdpError::ConnectionClosed
}

#[cfg(test)]
mod tests;
