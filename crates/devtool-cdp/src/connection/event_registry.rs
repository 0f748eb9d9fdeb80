//! Tracks event-name -> callback subscriptions for a [`crate::Connection`].
//!
//! Mirrors `CommandRegistry` in spirit: pure data, safe to mutate from
//! concurrent callers (registration) and from the single receive loop
//! (dispatch). Callbacks survive CDP domain disable/enable cycles on the
//! same connection — only [`EventRegistry::remove`] or dropping the whole
//! registry drops them.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

/// A registered event handler.
///
/// Boxed so that sync closures and futures-returning closures can share one
/// call surface; `Connection::dispatch_event` always spawns the returned
/// future onto its own task, so a handler that happens to be synchronous
/// just returns an already-ready future.
pub type EventCallback =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// One subscription: its callback, whether it fires once, and its id.
struct CallbackEntry {
    id: u64,
    callback: EventCallback,
    one_shot: bool,
}

/// Opaque handle returned by [`EventRegistry::register`], usable with
/// [`EventRegistry::remove`].
pub type CallbackId = u64;

/// `event name -> ordered list of callbacks`, plus a reverse index for O(1)
/// removal by id.
#[derive(Default)]
pub struct EventRegistry {
    next_id: AtomicU64,
    by_event: Mutex<HashMap<String, Vec<CallbackEntry>>>,
    id_to_event: Mutex<HashMap<CallbackId, String>>,
}

impl EventRegistry {
    /// Build an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            by_event: Mutex::new(HashMap::new()),
            id_to_event: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe `callback` to `event_name`.
    ///
    /// Entries for the same event are kept in registration order, though the
    /// receive loop dispatches each one on its own spawned task, so order is
    /// not an observation guarantee — only registration bookkeeping order.
    pub async fn register(
        &self,
        event_name: impl Into<String>,
        callback: EventCallback,
        one_shot: bool,
    ) -> CallbackId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let event_name = event_name.into();

        self.by_event
            .lock()
            .await
            .entry(event_name.clone())
            .or_default()
            .push(CallbackEntry {
                id,
                callback,
                one_shot,
            });
        self.id_to_event.lock().await.insert(id, event_name);

        id
    }

    /// Unregister a single callback by id. Returns `true` if it existed.
    pub async fn remove(&self, id: CallbackId) -> bool {
        let Some(event_name) = self.id_to_event.lock().await.remove(&id) else {
            return false;
        };

        let mut by_event = self.by_event.lock().await;
        if let Some(entries) = by_event.get_mut(&event_name) {
            entries.retain(|e| e.id != id);
            if entries.is_empty() {
                by_event.remove(&event_name);
            }
        }
        true
    }

    /// Drop every registered callback, for every event.
    pub async fn clear(&self) {
        self.by_event.lock().await.clear();
        self.id_to_event.lock().await.clear();
    }

    /// Take a snapshot of callbacks registered for `event_name`, removing
    /// any that are one-shot.
    ///
    /// The one-shot removal happens before the snapshot is returned to the
    /// caller (spec invariant: "a one-shot callback is removed before its
    /// function is awaited"), so a callback that re-subscribes to the same
    /// event from within itself sees a clean registry.
    pub async fn drain_for_dispatch(&self, event_name: &str) -> Vec<EventCallback> {
        let mut by_event = self.by_event.lock().await;
        let Some(entries) = by_event.get_mut(event_name) else {
            return Vec::new();
        };

        let mut callbacks = Vec::with_capacity(entries.len());
        let mut removed_ids = Vec::new();
        entries.retain(|entry| {
            callbacks.push(entry.callback.clone());
            if entry.one_shot {
                removed_ids.push(entry.id);
                false
            } else {
                true
            }
        });
        if entries.is_empty() {
            by_event.remove(event_name);
        }
        drop(by_event);

        if !removed_ids.is_empty() {
            let mut id_to_event = self.id_to_event.lock().await;
            for id in removed_ids {
                id_to_event.remove(&id);
            }
        }

        callbacks
    }

    /// Number of distinct callbacks registered for `event_name`.
    #[cfg(test)]
    pub async fn count_for(&self, event_name: &str) -> usize {
        self.by_event
            .lock()
            .await
            .get(event_name)
            .map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests;
