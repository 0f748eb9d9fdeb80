//! Browser domain types: downloads, permissions, and window geometry.

use serde::{Deserialize, Serialize};

/// Result of `Browser.getVersion`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVersionResult {
    /// Browser product string, e.g. `"HeadlessChrome/120.0.0.0"`.
    pub product: String,
    /// Protocol version implemented.
    pub protocol_version: String,
}

/// Behavior applied by `Browser.setDownloadBehavior`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DownloadBehaviorKind {
    /// Use the browser's default behavior.
    Default,
    /// Block downloads entirely.
    Deny,
    /// Allow downloads into `download_path`.
    Allow,
}

/// Parameters for `Browser.setDownloadBehavior`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDownloadBehaviorParams {
    /// Behavior to apply.
    pub behavior: DownloadBehaviorKind,
    /// Directory to save files into; required when `behavior` is `Allow`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    /// Browser context this applies to, or every context if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<String>,
}

/// Event: `Browser.downloadWillBegin`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadWillBeginEvent {
    /// Id correlating this download with later progress events.
    pub guid: String,
    /// URL the download was initiated from.
    pub url: String,
    /// Filename Chromium suggests for the download.
    pub suggested_filename: String,
}

/// Event: `Browser.downloadProgress`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgressEvent {
    /// Id matching a prior `DownloadWillBeginEvent`.
    pub guid: String,
    /// Current state: `"inProgress"`, `"completed"`, or `"canceled"`.
    pub state: String,
    /// Bytes received so far.
    pub received_bytes: i64,
    /// Total bytes expected, if known.
    pub total_bytes: i64,
}

/// Parameters for `Browser.grantPermissions`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GrantPermissionsParams {
    /// Permissions to grant, e.g. `["geolocation"]`.
    pub permissions: Vec<String>,
    /// Origin the grant applies to; every origin in the context if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Browser context the grant applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<String>,
}

/// Parameters for `Browser.resetPermissions`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResetPermissionsParams {
    /// Browser context to reset, or every context if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<String>,
}

/// Parameters for `Browser.getWindowForTarget`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWindowForTargetParams {
    /// Target whose containing window to look up.
    pub target_id: String,
}

/// Result of `Browser.getWindowForTarget`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetWindowForTargetResult {
    /// Id of the containing browser window.
    pub window_id: i64,
    /// Current window geometry.
    pub bounds: WindowBounds,
}

/// Window geometry and state, shared by `getWindowForTarget` and
/// `setWindowBounds`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WindowBounds {
    /// Horizontal offset from the screen origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<i32>,
    /// Vertical offset from the screen origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,
    /// Window width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    /// Window height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    /// Window state, e.g. `"normal"`, `"minimized"`, `"maximized"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_state: Option<String>,
}

/// Parameters for `Browser.setWindowBounds`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWindowBoundsParams {
    /// Window to resize/reposition.
    pub window_id: i64,
    /// New geometry.
    pub bounds: WindowBounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_behavior_omits_path_when_denying() {
        let json = serde_json::to_value(SetDownloadBehaviorParams {
            behavior: DownloadBehaviorKind::Deny,
            download_path: None,
            browser_context_id: None,
        })
        .unwrap();
        assert!(json.get("downloadPath").is_none());
        assert_eq!(json["behavior"], "deny");
    }
}
