//! Network domain types: cookies, request observation, and response bodies.

use serde::{Deserialize, Serialize};

/// A browser cookie, as returned by `Network.getCookies`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Cookie domain.
    pub domain: String,
    /// Cookie path.
    pub path: String,
    /// Whether the cookie requires HTTPS.
    pub secure: bool,
    /// Whether the cookie is hidden from `document.cookie`.
    pub http_only: bool,
}

/// Parameters for `Network.getCookies`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetCookiesParams {
    /// Restrict to cookies visible to these URLs; all cookies if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

/// Result of `Network.getCookies`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCookiesResult {
    /// Matching cookies.
    pub cookies: Vec<Cookie>,
}

/// Parameters for `Network.setCookies`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCookiesParams {
    /// Cookies to set.
    pub cookies: Vec<Cookie>,
}

/// Event: `Network.requestWillBeSent`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestWillBeSentEvent {
    /// Id correlating this event with the eventual response.
    pub request_id: String,
    /// The request itself.
    pub request: Request,
}

/// The request portion of `Network.requestWillBeSent`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
}

/// `Network.clearBrowserCookies` takes no parameters; request it with
/// `Option::<()>::None`.
/// Event: `Network.responseReceived`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedEvent {
    /// Id shared with the originating `requestWillBeSent` event.
    pub request_id: String,
    /// The response itself.
    pub response: Response,
}

/// The response portion of `Network.responseReceived`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// HTTP status code.
    pub status: i64,
}

/// Event: `Network.loadingFinished`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFinishedEvent {
    /// Id of the request that finished loading.
    pub request_id: String,
}

/// Event: `Network.loadingFailed`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailedEvent {
    /// Id of the request that failed.
    pub request_id: String,
    /// Human-readable failure reason.
    pub error_text: String,
}

/// Parameters for `Network.getResponseBody`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponseBodyParams {
    /// Id of the request whose response body should be fetched.
    pub request_id: String,
}

/// Result of `Network.getResponseBody`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponseBodyResult {
    /// Response body, as text or base64 depending on `base64_encoded`.
    pub body: String,
    /// Whether `body` is base64-encoded binary content.
    pub base64_encoded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_cookies_params_omit_urls_when_unset() {
        let json = serde_json::to_value(GetCookiesParams::default()).unwrap();
        assert!(json.get("urls").is_none());
    }
}
