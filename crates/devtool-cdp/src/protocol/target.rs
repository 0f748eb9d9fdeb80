//! Target domain types.
//!
//! Each target (page, popup, iframe, worker) gets its own `Connection`
//! dialed directly at its `webSocketDebuggerUrl`; this core never attaches a
//! session to a shared connection, so no `sessionId` appears anywhere here.

use serde::{Deserialize, Serialize};

/// Information about one target, as returned by `Target.getTargets`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Target identifier, stable for the life of the target.
    pub target_id: String,
    /// Target type, e.g. `"page"`, `"iframe"`, `"service_worker"`.
    #[serde(rename = "type")]
    pub target_type: String,
    /// Current title.
    pub title: String,
    /// Current URL.
    pub url: String,
    /// Whether some client has an active CDP connection to this target.
    pub attached: bool,
    /// Browser context this target belongs to, if any.
    pub browser_context_id: Option<String>,
}

/// Parameters for `Target.getTargets`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct GetTargetsParams {
    /// Restrict the returned set by target type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<TargetFilterEntry>>,
}

/// One entry of a `Target.getTargets` filter list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetFilterEntry {
    /// Target type to match, or `None` to match the rest.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    /// Whether matches should be excluded rather than included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<bool>,
}

/// Result of `Target.getTargets`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsResult {
    /// Every target currently known to the browser.
    pub target_infos: Vec<TargetInfo>,
}

/// Parameters for `Target.createTarget`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetParams {
    /// URL to navigate the new target to.
    pub url: String,
    /// Browser context to create the target in, if not the default one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<String>,
}

impl CreateTargetParams {
    /// A new target for `url` in the default browser context.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            browser_context_id: None,
        }
    }

    /// Scope the new target to `browser_context_id`.
    #[must_use]
    pub fn in_context(mut self, browser_context_id: impl Into<String>) -> Self {
        self.browser_context_id = Some(browser_context_id.into());
        self
    }
}

/// Result of `Target.createTarget`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
    /// Id of the newly created target.
    pub target_id: String,
}

/// Parameters for `Target.closeTarget`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTargetParams {
    /// Target to close.
    pub target_id: String,
}

/// Result of `Target.closeTarget`.
#[derive(Debug, Clone, Deserialize)]
pub struct CloseTargetResult {
    /// Whether the browser actually closed it.
    pub success: bool,
}

/// Parameters for `Target.createBrowserContext`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserContextParams {
    /// Proxy server for the new context, with any userinfo already stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_server: Option<String>,
    /// Hosts to bypass the proxy for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_bypass_list: Option<String>,
}

/// Result of `Target.createBrowserContext`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserContextResult {
    /// Id of the newly created context.
    pub browser_context_id: String,
}

/// Parameters for `Target.disposeBrowserContext`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposeBrowserContextParams {
    /// Context to dispose of, along with every target inside it.
    pub browser_context_id: String,
}

/// Result of `Target.getBrowserContexts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBrowserContextsResult {
    /// Every browser context currently alive.
    pub browser_context_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_target_params_omit_context_when_default() {
        let json = serde_json::to_value(CreateTargetParams::new("about:blank")).unwrap();
        assert!(json.get("browserContextId").is_none());
        assert_eq!(json["url"], "about:blank");
    }

    #[test]
    fn create_target_params_include_context_when_set() {
        let json =
            serde_json::to_value(CreateTargetParams::new("about:blank").in_context("ctx-1"))
                .unwrap();
        assert_eq!(json["browserContextId"], "ctx-1");
    }
}
