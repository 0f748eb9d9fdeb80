//! CDP wire message shapes.
//!
//! These types are pure data: no I/O happens here. `Connection` serializes
//! [`CdpRequest`] to JSON text frames and deserializes incoming frames into
//! [`CdpMessage`], routing each to either a pending command or the event
//! registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An outgoing CDP command: `{ id, method, params }`.
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Monotonically increasing, per-connection message id.
    pub id: u64,
    /// CDP method name, e.g. `"Page.navigate"`.
    pub method: String,
    /// Method parameters, already serialized to a JSON value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A successful or failed response to a [`CdpRequest`].
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponse {
    /// Id matching the originating request.
    pub id: u64,
    /// Present on success.
    pub result: Option<Value>,
    /// Present on failure.
    pub error: Option<CdpResponseError>,
}

/// The `error` object of a failed [`CdpResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponseError {
    /// CDP error code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

/// An unsolicited event pushed by the browser: `{ method, params }`.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpEvent {
    /// Event method name, e.g. `"Page.javascriptDialogOpening"`.
    pub method: String,
    /// Event parameters, left as a raw value for callers to deserialize.
    pub params: Option<Value>,
}

/// An incoming frame, which is either a response or an event.
///
/// Responses carry an `id`; events don't. `serde(untagged)` tries
/// [`CdpMessage::Response`] first, falling back to [`CdpMessage::Event`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CdpMessage {
    /// A reply to a previously sent command.
    Response(CdpResponse),
    /// A spontaneous protocol event.
    Event(CdpEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_with_id_parses_as_response() {
        let msg: CdpMessage = serde_json::from_str(r#"{"id":1,"result":{}}"#).unwrap();
        assert!(matches!(msg, CdpMessage::Response(_)));
    }

    #[test]
    fn message_without_id_parses_as_event() {
        let msg: CdpMessage =
            serde_json::from_str(r#"{"method":"Page.loadEventFired","params":{}}"#).unwrap();
        assert!(matches!(msg, CdpMessage::Event(_)));
    }

    #[test]
    fn error_response_carries_code_and_message() {
        let msg: CdpMessage =
            serde_json::from_str(r#"{"id":2,"error":{"code":-32601,"message":"boom"}}"#).unwrap();
        let CdpMessage::Response(resp) = msg else {
            panic!("expected response")
        };
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn request_serializes_without_params_when_none() {
        let req = CdpRequest {
            id: 7,
            method: "Page.enable".to_string(),
            params: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("params"));
    }
}
