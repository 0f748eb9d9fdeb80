use super::*;

#[test]
fn new_connection_is_not_connected_or_closed() {
    let conn = Connection::new("ws://127.0.0.1:1/devtools/page/abc");
    assert!(!conn.is_closed());
}

#[tokio::test]
async fn connecting_to_an_unreachable_url_returns_connection_failed() {
    // Nothing listens on this port, so the handshake itself fails fast.
    let conn = Connection::new("ws://127.0.0.1:1/devtools/page/abc");
    let err = conn.ensure_connected().await.unwrap_err();
    assert!(matches!(err, CdpError::ConnectionFailed(_)));
}

#[tokio::test]
async fn executing_a_command_on_an_unreachable_socket_fails_to_connect() {
    let conn = Connection::new("ws://127.0.0.1:1/devtools/page/abc");
    let result = conn
        .execute_command::<(), serde_json::Value>("Page.enable", None)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn dialog_slot_starts_empty_and_can_be_cleared() {
    let conn = Connection::new("ws://127.0.0.1:1/devtools/page/abc");
    assert!(conn.dialog_slot().await.is_none());
    conn.clear_dialog_slot().await;
    assert!(conn.dialog_slot().await.is_none());
}

#[tokio::test]
async fn close_before_connecting_is_a_no_op_that_marks_closed() {
    let conn = Connection::new("ws://127.0.0.1:1/devtools/page/abc");
    conn.close().await;
    assert!(conn.is_closed());
}

#[tokio::test]
async fn registering_and_removing_a_callback_round_trips() {
    let conn = Connection::new("ws://127.0.0.1:1/devtools/page/abc");
    let id = conn
        .register_callback("Page.loadEventFired", Arc::new(|_| Box::pin(async {})))
        .await;
    assert!(conn.remove_callback(id).await);
    assert!(!conn.remove_callback(id).await);
}
