//! Domain error types for browser lifecycle, tabs, locators, and elements.

use std::time::Duration;

use thiserror::Error;

use devtool_cdp::CdpError;

/// Errors surfaced by the browser automation core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No Chromium-family binary could be found in the configured, env, or
    /// common-path search order.
    #[error("no Chromium-family browser binary found")]
    BrowserBinaryNotFound,

    /// The browser process started but never became reachable over CDP.
    #[error("failed to start browser: {0}")]
    FailedToStartBrowser(String),

    /// `Page.navigate` reported a failure, or the page never reached
    /// `readyState: complete` within the navigation timeout.
    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    /// The configured debugging port was not a valid/usable TCP port.
    #[error("invalid connection port: {0}")]
    InvalidConnectionPort(String),

    /// Transport or protocol failure talking to a target's connection.
    #[error(transparent)]
    Cdp(#[from] CdpError),

    /// A `find`/`query` with zero matches and `raise_exc = true`.
    #[error("element not found")]
    ElementNotFound,

    /// Polling for an element exceeded its timeout.
    #[error("timed out waiting for element after {0:?}")]
    WaitElementTimeout(Duration),

    /// A `query` expression could not be classified as CSS/ID/class/XPath.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// The element exists but fails the visibility check.
    #[error("element is not visible")]
    ElementNotVisible,

    /// The element exists and is visible but is covered or disabled.
    #[error("element is not interactable")]
    ElementNotInteractable,

    /// A screenshot/download path had an extension that maps to no known
    /// image format.
    #[error("unsupported file extension: {0}")]
    InvalidFileExtension(String),

    /// Neither a path nor `as_base64` was requested for a screenshot/PDF.
    #[error("screenshot requires a path or as_base64=true")]
    MissingScreenshotPath,

    /// A tab-level capture was attempted on a target that cannot produce
    /// one, e.g. an iframe target.
    #[error("operation requires a top-level target")]
    TopLevelTargetRequired,

    /// `get_frame` was called on an element with no navigable `src`.
    #[error("iframe element has no src attribute")]
    IFrameHasNoSrc,

    /// `get_frame`'s `src` did not match any known target.
    #[error("no target found for iframe src")]
    IFrameTargetNotFound,

    /// Proxy authentication was attempted and rejected on every handler.
    #[error("proxy authentication failed")]
    ProxyAuthenticationFailed,

    /// `expect_download` did not observe completion within its timeout.
    #[error("download timed out after {0:?}")]
    DownloadTimeout(Duration),

    /// The browser reported the download as failed or canceled.
    #[error("download failed: {0}")]
    DownloadFailed(String),

    /// An operation was attempted on a Tab that has already closed.
    #[error("tab is closed")]
    TabClosed,

    /// An operation was attempted on a browser context that has already
    /// been disposed.
    #[error("browser context is closed")]
    BrowserContextClosed,

    /// Filesystem failure, e.g. preparing a temp profile directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure, e.g. encoding a selector for injection
    /// into a CDP expression.
    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdp_error_converts_via_from() {
        let cdp_err = CdpError::ConnectionClosed;
        let core_err: CoreError = cdp_err.into();
        assert!(matches!(core_err, CoreError::Cdp(CdpError::ConnectionClosed)));
    }

    #[test]
    fn display_messages_are_human_readable() {
        assert_eq!(
            CoreError::ElementNotFound.to_string(),
            "element not found"
        );
    }
}
