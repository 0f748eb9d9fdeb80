//! Fetch domain types: request interception and proxy authentication.

use serde::{Deserialize, Serialize};

/// Event: `Fetch.requestPaused`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPausedEvent {
    /// Id used to resolve this pause via `continueRequest`/`fulfillRequest`/
    /// `failRequest`.
    pub request_id: String,
    /// URL of the paused request.
    pub request_url: String,
}

/// Event: `Fetch.authRequired`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequiredEvent {
    /// Id used to resolve this pause via `continueWithAuth`.
    pub request_id: String,
    /// Origin requesting credentials, e.g. the proxy's own `host:port`.
    pub auth_challenge: AuthChallenge,
}

/// The challenge portion of `Fetch.authRequired`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallenge {
    /// Challenge source, `"Server"` or `"Proxy"`.
    pub source: Option<String>,
    /// Origin issuing the challenge.
    pub origin: String,
    /// Authentication realm.
    pub realm: String,
    /// Authentication scheme, e.g. `"basic"`.
    pub scheme: String,
}

/// One entry of `Fetch.enable`'s `patterns` list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPattern {
    /// Glob pattern matched against the request URL; `"*"` matches everything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,
    /// Restrict interception to one resource type, e.g. `"XHR"`, `"Document"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

/// Parameters for `Fetch.enable`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnableParams {
    /// Whether paused requests should include auth challenges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_auth_requests: Option<bool>,
    /// Restrict interception to requests matching these patterns; every
    /// request is paused if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<RequestPattern>>,
}

impl EnableParams {
    /// Enable interception including proxy/server auth challenges.
    #[must_use]
    pub fn with_auth_handling() -> Self {
        Self {
            handle_auth_requests: Some(true),
            patterns: None,
        }
    }

    /// Enable interception scoped to `url_pattern`/`resource_type`, without
    /// auth-challenge handling.
    #[must_use]
    pub fn with_pattern(url_pattern: Option<String>, resource_type: Option<String>) -> Self {
        Self {
            handle_auth_requests: None,
            patterns: Some(vec![RequestPattern {
                url_pattern,
                resource_type,
            }]),
        }
    }
}

/// Parameters for `Fetch.continueRequest`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContinueRequestParams {
    /// Request to resume.
    pub request_id: String,
    /// Override the request URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Parameters for `Fetch.failRequest`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailRequestParams {
    /// Request to fail.
    pub request_id: String,
    /// Reason reported to the page, e.g. `"Failed"`, `"Aborted"`.
    pub error_reason: String,
}

/// One response header set by `Fetch.fulfillRequest`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderEntry {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// Parameters for `Fetch.fulfillRequest`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FulfillRequestParams {
    /// Request to fulfill synthetically.
    pub request_id: String,
    /// HTTP status code to report.
    pub response_code: i32,
    /// Response headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<Vec<HeaderEntry>>,
    /// Base64-encoded response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Response to an `AuthChallenge`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallengeResponse {
    /// `"ProvideCredentials"`, `"CancelAuth"`, `"Default"`.
    pub response: String,
    /// Username, required when `response` is `"ProvideCredentials"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password, required when `response` is `"ProvideCredentials"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AuthChallengeResponse {
    /// Provide `username`/`password` for this challenge.
    #[must_use]
    pub fn provide(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            response: "ProvideCredentials".to_string(),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Decline the challenge and let the request fail.
    #[must_use]
    pub fn cancel() -> Self {
        Self {
            response: "CancelAuth".to_string(),
            username: None,
            password: None,
        }
    }
}

/// Parameters for `Fetch.continueWithAuth`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueWithAuthParams {
    /// Request the challenge was raised for.
    pub request_id: String,
    /// How to answer the challenge.
    pub auth_challenge_response: AuthChallengeResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provide_credentials_sets_response_kind() {
        let response = AuthChallengeResponse::provide("user", "pass");
        assert_eq!(response.response, "ProvideCredentials");
        assert_eq!(response.username.as_deref(), Some("user"));
    }

    #[test]
    fn cancel_has_no_credentials() {
        let response = AuthChallengeResponse::cancel();
        assert!(response.username.is_none());
        assert!(response.password.is_none());
    }
}
