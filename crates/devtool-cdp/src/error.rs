//! CDP transport and protocol error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to a browser over the Chrome DevTools
/// Protocol.
#[derive(Error, Debug)]
pub enum CdpError {
    /// The WebSocket connection could not be established.
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    /// The WebSocket connection was lost, either during a send or while a
    /// command was awaiting its response.
    #[error("connection closed")]
    ConnectionClosed,

    /// `execute_command` was given something that is not a well-formed CDP
    /// command (missing `method`, or not an object).
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The browser's response took longer than the command's timeout.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// The browser replied with a CDP `error` object.
    #[error("CDP protocol error {code}: {message}")]
    Protocol {
        /// Numeric CDP error code.
        code: i32,
        /// Human-readable error message from the browser.
        message: String,
    },

    /// Failed to serialize a command or deserialize a response/event.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint URL handed to `connect`/`connect_via_http` was not a
    /// usable `ws://`, `wss://`, `http://`, or `https://` URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpointUrl(String),

    /// Connecting to the CDP HTTP endpoint took too long.
    #[error("connection timed out after {0:?}")]
    ConnectionTimeout(Duration),

    /// The `/json/version` HTTP discovery request failed or returned an
    /// unusable payload.
    #[error("failed to discover CDP endpoint at {url}: {reason}")]
    EndpointDiscoveryFailed {
        /// The endpoint that was queried.
        url: String,
        /// Why discovery failed.
        reason: String,
    },

    /// The underlying HTTP request (used only for discovery) failed.
    #[error("HTTP request failed: {0}")]
    HttpRequestFailed(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        match err {
            tokio_tungstenite::tungstenite::Error::ConnectionClosed
            | tokio_tungstenite::tungstenite::Error::AlreadyClosed => Self::ConnectionClosed,
            other => Self::ConnectionFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display_includes_code_and_message() {
        let err = CdpError::Protocol {
            code: -32000,
            message: "Node not found".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("-32000"));
        assert!(rendered.contains("Node not found"));
    }

    #[test]
    fn tungstenite_closed_maps_to_connection_closed() {
        let err: CdpError = tokio_tungstenite::tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, CdpError::ConnectionClosed));
    }
}
