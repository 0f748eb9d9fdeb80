//! Page domain types: navigation, screenshots, PDF export, dialogs, and the
//! file-chooser interception event.

use serde::{Deserialize, Serialize};

/// Parameters for `Page.navigate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    /// Destination URL.
    pub url: String,
}

/// Result of `Page.navigate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResult {
    /// Id of the frame that navigated.
    pub frame_id: String,
    /// Set when the navigation was blocked or failed outright.
    pub error_text: Option<String>,
}

/// One entry of `Page.getNavigationHistory`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
    /// History entry id.
    pub id: i64,
    /// URL at this history entry.
    pub url: String,
    /// Page title at this history entry.
    pub title: String,
}

/// Result of `Page.getNavigationHistory`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNavigationHistoryResult {
    /// Index of the current entry in `entries`.
    pub current_index: i64,
    /// Every entry in the history stack.
    pub entries: Vec<NavigationEntry>,
}

/// Image format accepted by `Page.captureScreenshot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    /// Lossless PNG.
    Png,
    /// Lossy JPEG.
    Jpeg,
    /// Lossy WebP.
    Webp,
}

impl ScreenshotFormat {
    /// Infer a format from a file extension, normalizing `jpg` to `jpeg`.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Viewport-relative clip rectangle for `Page.captureScreenshot`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotClip {
    /// Left edge, in CSS pixels.
    pub x: f64,
    /// Top edge, in CSS pixels.
    pub y: f64,
    /// Clip width, in CSS pixels.
    pub width: f64,
    /// Clip height, in CSS pixels.
    pub height: f64,
    /// Scale to apply to the clip region.
    pub scale: f64,
}

/// Parameters for `Page.captureScreenshot`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScreenshotParams {
    /// Image format; defaults to PNG if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ScreenshotFormat>,
    /// JPEG/WebP quality, 0-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Capture the full scrollable page rather than just the viewport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_beyond_viewport: Option<bool>,
    /// Restrict the capture to this rectangle, used for element screenshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ScreenshotClip>,
}

/// Result of `Page.captureScreenshot`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScreenshotResult {
    /// Base64-encoded image bytes. Absent for targets that cannot render a
    /// top-level capture, e.g. iframe targets.
    pub data: Option<String>,
}

/// Parameters for `Page.printToPDF`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrintToPdfParams {
    /// Print background graphics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_background: Option<bool>,
    /// Paper landscape orientation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landscape: Option<bool>,
    /// Print the header/footer template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_header_footer: Option<bool>,
    /// Page scale factor, clamped to `[0.1, 2.0]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// Result of `Page.printToPDF`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintToPdfResult {
    /// Base64-encoded PDF bytes.
    pub data: String,
}

/// Action taken by `Page.handleJavaScriptDialog`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleJavaScriptDialogParams {
    /// Accept (`true`) or dismiss (`false`) the dialog.
    pub accept: bool,
    /// Text to fill into a `prompt()` dialog before accepting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
}

/// Event: `Page.javascriptDialogOpening`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavascriptDialogOpeningEvent {
    /// URL of the frame that triggered the dialog.
    pub url: String,
    /// Dialog message text.
    pub message: String,
    /// Dialog kind: `"alert"`, `"confirm"`, `"prompt"`, or `"beforeunload"`.
    #[serde(rename = "type")]
    pub dialog_type: String,
    /// Default value offered by a `prompt()` dialog.
    pub default_prompt: Option<String>,
}

/// Event: `Page.fileChooserOpened`, fired only once
/// `Page.setInterceptFileChooserDialog(true)` is active.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChooserOpenedEvent {
    /// Id of the backend node that triggered the chooser.
    pub backend_node_id: Option<i64>,
    /// Whether multiple files may be selected.
    pub mode: String,
}

/// Parameters for `Page.setInterceptFileChooserDialog`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetInterceptFileChooserDialogParams {
    /// Whether to intercept file chooser dialogs instead of showing them.
    pub enabled: bool,
}

/// Parameters for `Page.handleFileChooser`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleFileChooserParams {
    /// Always `"accept"`: the core never simulates a user canceling.
    pub action: String,
    /// Absolute paths of files to attach.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

impl HandleFileChooserParams {
    /// Accept the chooser with `files`.
    #[must_use]
    pub fn accept(files: Vec<String>) -> Self {
        Self {
            action: "accept".to_string(),
            files: Some(files),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpg_extension_normalizes_to_jpeg_format() {
        assert_eq!(
            ScreenshotFormat::from_extension("JPG"),
            Some(ScreenshotFormat::Jpeg)
        );
    }

    #[test]
    fn unknown_extension_yields_none() {
        assert_eq!(ScreenshotFormat::from_extension("bmp"), None);
    }

    #[test]
    fn dialog_params_omit_prompt_text_when_absent() {
        let json = serde_json::to_value(HandleJavaScriptDialogParams {
            accept: true,
            prompt_text: None,
        })
        .unwrap();
        assert!(json.get("promptText").is_none());
    }
}
