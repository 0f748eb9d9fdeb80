use super::*;
use crate::transport::CdpResponse;

#[tokio::test]
async fn ids_are_unique_and_increasing() {
    let registry = CommandRegistry::new();
    let (id1, _rx1) = registry.create().await;
    let (id2, _rx2) = registry.create().await;
    assert!(id2 > id1);
}

#[tokio::test]
async fn resolve_completes_the_matching_waiter() {
    let registry = CommandRegistry::new();
    let (id, rx) = registry.create().await;

    let resolved = registry
        .resolve(CdpResponse {
            id,
            result: Some(serde_json::json!({"ok": true})),
            error: None,
        })
        .await;
    assert!(resolved);

    let response = rx.await.unwrap();
    assert_eq!(response.id, id);
    assert_eq!(response.result.unwrap()["ok"], true);
}

#[tokio::test]
async fn resolve_for_unknown_id_is_a_noop() {
    let registry = CommandRegistry::new();
    let resolved = registry
        .resolve(CdpResponse {
            id: 999,
            result: None,
            error: None,
        })
        .await;
    assert!(!resolved);
}

#[tokio::test]
async fn cancel_drops_the_waiter_without_a_value() {
    let registry = CommandRegistry::new();
    let (id, rx) = registry.create().await;
    registry.cancel(id).await;
    assert!(rx.await.is_err());
}

#[tokio::test]
async fn cancel_all_drains_every_pending_command() {
    let registry = CommandRegistry::new();
    let (_id1, rx1) = registry.create().await;
    let (_id2, rx2) = registry.create().await;
    assert_eq!(registry.pending_count().await, 2);

    registry.cancel_all().await;

    assert_eq!(registry.pending_count().await, 0);
    assert!(rx1.await.is_err());
    assert!(rx2.await.is_err());
}
