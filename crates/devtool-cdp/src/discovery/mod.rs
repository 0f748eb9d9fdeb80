//! CDP endpoint discovery via the browser's HTTP debugging endpoint.
//!
//! Chromium exposes `http://host:port/json/version`, which returns JSON
//! including `webSocketDebuggerUrl` — the browser-scoped WebSocket endpoint.
//! This module polls that endpoint until it answers (spec §6: "poll
//! `http://localhost:<port>/json/version` ... until it returns a JSON object
//! containing a `webSocketDebuggerUrl` field").

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::CdpError;

/// Response shape of `GET /json/version`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrowserVersion {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
}

/// Fetch the browser-scoped WebSocket URL from `http://host:port`.
///
/// If `endpoint_url` is already a `ws://`/`wss://` URL it is returned
/// unchanged; otherwise `/json/version` is queried once.
///
/// # Errors
///
/// Returns [`CdpError::InvalidEndpointUrl`] for a malformed or unsupported
/// scheme, [`CdpError::HttpRequestFailed`] on transport errors, and
/// [`CdpError::EndpointDiscoveryFailed`] if the endpoint answered but had no
/// `webSocketDebuggerUrl`.
pub async fn discover_websocket_url(endpoint_url: &str) -> Result<String, CdpError> {
    let base = Url::parse(endpoint_url)
        .map_err(|e| CdpError::InvalidEndpointUrl(format!("{endpoint_url}: {e}")))?;

    if base.scheme() == "ws" || base.scheme() == "wss" {
        return Ok(endpoint_url.to_string());
    }
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(CdpError::InvalidEndpointUrl(format!(
            "expected http, https, ws, or wss scheme, got: {}",
            base.scheme()
        )));
    }

    let version_url = base
        .join("/json/version")
        .map_err(|e| CdpError::InvalidEndpointUrl(format!("failed to build version URL: {e}")))?;

    let response = reqwest::get(version_url.as_str())
        .await
        .map_err(|e| CdpError::HttpRequestFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(CdpError::EndpointDiscoveryFailed {
            url: endpoint_url.to_string(),
            reason: format!("HTTP status {}", response.status()),
        });
    }

    let version: BrowserVersion =
        response
            .json()
            .await
            .map_err(|e| CdpError::EndpointDiscoveryFailed {
                url: endpoint_url.to_string(),
                reason: format!("failed to parse response: {e}"),
            })?;

    version
        .web_socket_debugger_url
        .ok_or_else(|| CdpError::EndpointDiscoveryFailed {
            url: endpoint_url.to_string(),
            reason: "response missing webSocketDebuggerUrl field".to_string(),
        })
}

/// Poll `http://localhost:<port>/json/version` until it is reachable or
/// `overall_timeout` elapses.
///
/// Used by `Browser::start` right after spawning the browser process, since
/// the debugging port isn't immediately accepting connections.
///
/// # Errors
///
/// Returns [`CdpError::ConnectionTimeout`] if the endpoint never became
/// reachable within `overall_timeout`.
#[instrument(level = "info", skip(overall_timeout))]
pub async fn wait_for_endpoint(port: u16, overall_timeout: Duration) -> Result<String, CdpError> {
    let endpoint = format!("http://localhost:{port}");
    let deadline = Instant::now() + overall_timeout;
    let poll_interval = Duration::from_millis(100);

    loop {
        match discover_websocket_url(&endpoint).await {
            Ok(ws_url) => {
                info!(ws_url = %ws_url, "CDP endpoint reachable");
                return Ok(ws_url);
            }
            Err(_) if Instant::now() < deadline => {
                debug!("CDP endpoint not yet reachable, retrying");
                tokio::time::sleep(poll_interval).await;
            }
            Err(_) => {
                return Err(CdpError::ConnectionTimeout(overall_timeout));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ws_url_passes_through_unchanged() {
        let url = discover_websocket_url("ws://localhost:9222/devtools/browser/abc")
            .await
            .unwrap();
        assert_eq!(url, "ws://localhost:9222/devtools/browser/abc");
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let err = discover_websocket_url("file:///tmp/x").await.unwrap_err();
        assert!(matches!(err, CdpError::InvalidEndpointUrl(_)));
    }

    #[tokio::test]
    async fn malformed_url_is_rejected() {
        let err = discover_websocket_url("not a url").await.unwrap_err();
        assert!(matches!(err, CdpError::InvalidEndpointUrl(_)));
    }
}
