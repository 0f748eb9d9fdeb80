use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;

fn counting_callback(counter: Arc<AtomicUsize>) -> EventCallback {
    Arc::new(move |_value| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    })
}

#[tokio::test]
async fn dispatch_invokes_every_registered_callback_for_the_event() {
    let registry = EventRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));

    registry
        .register("Page.loadEventFired", counting_callback(counter.clone()), false)
        .await;
    registry
        .register("Page.loadEventFired", counting_callback(counter.clone()), false)
        .await;

    let callbacks = registry.drain_for_dispatch("Page.loadEventFired").await;
    assert_eq!(callbacks.len(), 2);
    for cb in callbacks {
        cb(serde_json::Value::Null).await;
    }
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    // Non-one-shot callbacks are still registered after dispatch.
    assert_eq!(registry.count_for("Page.loadEventFired").await, 2);
}

#[tokio::test]
async fn one_shot_callback_is_removed_before_being_returned() {
    let registry = EventRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry
        .register("Page.javascriptDialogOpening", counting_callback(counter), true)
        .await;

    assert_eq!(registry.count_for("Page.javascriptDialogOpening").await, 1);
    let callbacks = registry
        .drain_for_dispatch("Page.javascriptDialogOpening")
        .await;
    assert_eq!(callbacks.len(), 1);
    // Removed from the table even before the caller awaits the callback.
    assert_eq!(registry.count_for("Page.javascriptDialogOpening").await, 0);
}

#[tokio::test]
async fn remove_drops_a_specific_callback_and_leaves_others() {
    let registry = EventRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let id_a = registry
        .register("Network.requestWillBeSent", counting_callback(counter.clone()), false)
        .await;
    registry
        .register("Network.requestWillBeSent", counting_callback(counter.clone()), false)
        .await;

    assert!(registry.remove(id_a).await);
    assert_eq!(registry.count_for("Network.requestWillBeSent").await, 1);

    // Removing it twice is a no-op that reports it wasn't found.
    assert!(!registry.remove(id_a).await);
}

#[tokio::test]
async fn remove_unknown_id_returns_false() {
    let registry = EventRegistry::new();
    assert!(!registry.remove(42).await);
}

#[tokio::test]
async fn clear_drops_every_event_and_callback() {
    let registry = EventRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    registry
        .register("Page.loadEventFired", counting_callback(counter.clone()), false)
        .await;
    registry
        .register("Network.loadingFinished", counting_callback(counter), false)
        .await;

    registry.clear().await;

    assert_eq!(registry.count_for("Page.loadEventFired").await, 0);
    assert_eq!(registry.count_for("Network.loadingFinished").await, 0);
}

#[tokio::test]
async fn registering_after_clear_leaves_no_trace_of_prior_registration() {
    // Exercises: on(event, f); remove_callback(id_of_f) leaves the registry
    // in the same state as never-registered.
    let registry = EventRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let id = registry
        .register("Page.loadEventFired", counting_callback(counter), false)
        .await;
    registry.remove(id).await;
    assert_eq!(registry.count_for("Page.loadEventFired").await, 0);
}
