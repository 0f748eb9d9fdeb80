//! [`Tab`]: one browser target (page or iframe), its own [`Connection`], and
//! the navigation/scripting/observation surface exposed on it.

pub mod download;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use devtool_cdp::protocol::dom::{GetDocumentParams, GetDocumentResult, GetOuterHtmlParams, GetOuterHtmlResult};
use devtool_cdp::protocol::emulation::{SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams};
use devtool_cdp::protocol::fetch::EnableParams as FetchEnableParams;
use devtool_cdp::protocol::network::{
    Cookie, GetCookiesParams, GetCookiesResult, GetResponseBodyParams, GetResponseBodyResult,
    LoadingFailedEvent, Request, RequestWillBeSentEvent, Response, ResponseReceivedEvent, SetCookiesParams,
};
use devtool_cdp::protocol::page::{
    CaptureScreenshotParams, CaptureScreenshotResult, FileChooserOpenedEvent,
    GetNavigationHistoryResult, HandleFileChooserParams, HandleJavaScriptDialogParams,
    JavascriptDialogOpeningEvent, NavigateParams, NavigateResult, PrintToPdfParams,
    PrintToPdfResult, ScreenshotFormat, SetInterceptFileChooserDialogParams,
};
use devtool_cdp::protocol::runtime::{CallFunctionOnParams, EvaluateParams, EvaluateResult};
use devtool_cdp::protocol::target::CloseTargetParams;
use devtool_cdp::{CdpError, Connection};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{instrument, warn};

use crate::browser::Browser;
use crate::element::WebElement;
use crate::error::CoreError;
use crate::locator::Locator;
use crate::proxy::{ProxyAuthStore, ProxyCredentials, DEFAULT_CONTEXT_KEY};

pub use download::{Download, DownloadGuard, DownloadProgress, DownloadState};

/// How long `document.readyState` is polled for before [`Tab::go_to`] gives
/// up.
const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Interval between `document.readyState` polls during navigation.
const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One entry of a [`Tab`]'s network log, correlated by CDP `requestId`.
#[derive(Debug, Clone)]
pub struct NetworkLogEntry {
    /// CDP request id.
    pub request_id: String,
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Response status, once `Network.responseReceived` has fired.
    pub status: Option<i64>,
    /// Failure reason, if `Network.loadingFailed` fired instead of a
    /// response.
    pub error: Option<String>,
}

struct NetworkLog {
    capacity: usize,
    entries: VecDeque<NetworkLogEntry>,
}

impl NetworkLog {
    fn push(&mut self, entry: NetworkLogEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn update_status(&mut self, request_id: &str, status: i64) {
        if let Some(entry) = self.entries.iter_mut().rev().find(|e| e.request_id == request_id) {
            entry.status = Some(status);
        }
    }

    fn mark_failed(&mut self, request_id: &str, error: String) {
        if let Some(entry) = self.entries.iter_mut().rev().find(|e| e.request_id == request_id) {
            entry.error = Some(error);
        }
    }
}

/// One browser target: a top-level page or an iframe within one, each with
/// its own [`Connection`] dialed directly at the target's
/// `webSocketDebuggerUrl`.
pub struct Tab {
    connection: Arc<Connection>,
    target_id: String,
    browser_context_id: Option<String>,
    browser: Weak<Browser>,
    closed: AtomicBool,
    proxy_auth_installed: AtomicBool,
    page_events_enabled: AtomicBool,
    network_events_enabled: AtomicBool,
    dom_events_enabled: AtomicBool,
    runtime_events_enabled: AtomicBool,
    fetch_events_enabled: AtomicBool,
    file_chooser_intercept_enabled: AtomicBool,
    network_log: Arc<Mutex<NetworkLog>>,
}

impl Tab {
    pub(crate) fn new(
        connection: Arc<Connection>,
        target_id: String,
        browser_context_id: Option<String>,
        browser: Weak<Browser>,
    ) -> Arc<Self> {
        Arc::new(Self {
            connection,
            target_id,
            browser_context_id,
            browser,
            closed: AtomicBool::new(false),
            proxy_auth_installed: AtomicBool::new(false),
            page_events_enabled: AtomicBool::new(false),
            network_events_enabled: AtomicBool::new(false),
            dom_events_enabled: AtomicBool::new(false),
            runtime_events_enabled: AtomicBool::new(false),
            fetch_events_enabled: AtomicBool::new(false),
            file_chooser_intercept_enabled: AtomicBool::new(false),
            network_log: Arc::new(Mutex::new(NetworkLog {
                capacity: 0,
                entries: VecDeque::new(),
            })),
        })
    }

    /// This target's CDP `TargetId`.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// The browser context this target belongs to, or `None` for the
    /// default context.
    #[must_use]
    pub fn browser_context_id(&self) -> Option<String> {
        self.browser_context_id.clone()
    }

    /// Whether [`Tab::close`] has already run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close this target: `Target.closeTarget` on the browser connection,
    /// then tear down this tab's own connection. Idempotent.
    #[instrument(level = "debug", skip(self), fields(target_id = %self.target_id))]
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(browser) = self.browser.upgrade() {
            let result = browser
                .connection()
                .execute_command::<_, Value>(
                    "Target.closeTarget",
                    Some(CloseTargetParams {
                        target_id: self.target_id.clone(),
                    }),
                )
                .await;
            if let Err(e) = result {
                warn!(error = %e, target_id = %self.target_id, "failed to close target cleanly");
            }
        }
        self.connection.close().await;
    }

    /// Install tab-scoped Fetch auth handlers answering every challenge with
    /// `credentials`. Idempotent per tab.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] if `Fetch.enable` fails.
    pub async fn enable_proxy_auth(&self, credentials: ProxyCredentials) -> Result<(), CoreError> {
        if self.proxy_auth_installed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let store = Arc::new(ProxyAuthStore::new());
        store.insert(DEFAULT_CONTEXT_KEY, credentials);
        crate::browser::install_proxy_auth_handlers(&self.connection, store, DEFAULT_CONTEXT_KEY.to_string()).await
    }

    // --- Navigation -----------------------------------------------------

    /// Navigate to `url` and wait for `document.readyState` to reach
    /// `"complete"`. If `url` equals the current URL, a `Page.reload` is
    /// issued instead of `Page.navigate`, so the caller cannot silently
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NavigationFailed`] if `Page.navigate` reports a
    /// failure or the page never becomes ready within `timeout`
    /// (default [`DEFAULT_NAVIGATION_TIMEOUT`]). Propagates
    /// [`CoreError::Cdp`] on protocol failure.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn go_to(&self, url: &str, timeout: Option<Duration>) -> Result<(), CoreError> {
        let timeout = timeout.unwrap_or(DEFAULT_NAVIGATION_TIMEOUT);
        let same_url = self.current_url().await.is_ok_and(|current| current == url);
        if same_url {
            self.reload().await?;
        } else {
            let result: NavigateResult = self
                .connection
                .execute_command("Page.navigate", Some(NavigateParams { url: url.to_string() }))
                .await?;
            if let Some(error_text) = result.error_text {
                return Err(CoreError::NavigationFailed(error_text));
            }
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let ready: EvaluateResult = self
                .connection
                .execute_command("Runtime.evaluate", Some(EvaluateParams::returning_value("document.readyState")))
                .await?;
            if ready.result.value.as_ref().and_then(Value::as_str) == Some("complete") {
                return Ok(());
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(CoreError::NavigationFailed(format!(
                    "readyState never reached complete within {timeout:?}"
                )));
            }
            tokio::time::sleep(READINESS_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Reload the page.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn reload(&self) -> Result<(), CoreError> {
        self.connection.execute_command::<(), Value>("Page.reload", None).await?;
        Ok(())
    }

    /// Navigate back one entry in this target's history.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn go_back(&self) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>("Runtime.evaluate", Some(EvaluateParams::returning_value("window.history.back()")))
            .await?;
        Ok(())
    }

    /// Navigate forward one entry in this target's history.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn go_forward(&self) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Runtime.evaluate",
                Some(EvaluateParams::returning_value("window.history.forward()")),
            )
            .await?;
        Ok(())
    }

    /// The full navigation history stack for this target.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn navigation_history(&self) -> Result<GetNavigationHistoryResult, CoreError> {
        Ok(self
            .connection
            .execute_command::<(), GetNavigationHistoryResult>("Page.getNavigationHistory", None)
            .await?)
    }

    /// The current URL, via `window.location.href`.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn current_url(&self) -> Result<String, CoreError> {
        let result: EvaluateResult = self
            .connection
            .execute_command("Runtime.evaluate", Some(EvaluateParams::returning_value("window.location.href")))
            .await?;
        Ok(result.result.value.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default())
    }

    /// The current document title.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn title(&self) -> Result<String, CoreError> {
        let result: EvaluateResult = self
            .connection
            .execute_command("Runtime.evaluate", Some(EvaluateParams::returning_value("document.title")))
            .await?;
        Ok(result.result.value.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default())
    }

    /// The page's serialized HTML, via `DOM.getDocument` + `DOM.getOuterHTML`.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn page_source(&self) -> Result<String, CoreError> {
        let document: GetDocumentResult = self
            .connection
            .execute_command("DOM.getDocument", Some(GetDocumentParams { depth: Some(-1) }))
            .await?;
        let outer_html: GetOuterHtmlResult = self
            .connection
            .execute_command(
                "DOM.getOuterHTML",
                Some(GetOuterHtmlParams {
                    node_id: Some(document.root.node_id),
                    object_id: None,
                }),
            )
            .await?;
        Ok(outer_html.outer_html)
    }

    // --- Scripting --------------------------------------------------------

    /// Evaluate `script` in the page, or against `argument`'s node if given.
    /// When `argument` is set, every bareword occurrence of `argument` in
    /// `script` is rewritten to `this`, then the result is run bound to the
    /// element's object: a bare statement body is auto-wrapped in
    /// `function() { ... }`, but a `script` that already reads as a function
    /// or arrow expression is passed through unwrapped.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn execute_script(&self, script: &str, argument: Option<&WebElement>) -> Result<Value, CoreError> {
        match argument {
            Some(element) => {
                let body = replace_bareword(script, "argument", "this");
                let function_declaration = if is_function_expression(&body) {
                    body
                } else {
                    format!("function() {{ {body} }}")
                };
                let result: EvaluateResult = self
                    .connection
                    .execute_command(
                        "Runtime.callFunctionOn",
                        Some(CallFunctionOnParams {
                            function_declaration,
                            object_id: Some(element.object_id().to_string()),
                            arguments: None,
                            return_by_value: Some(true),
                        }),
                    )
                    .await?;
                Ok(result.result.value.unwrap_or(Value::Null))
            }
            None => {
                let result: EvaluateResult = self
                    .connection
                    .execute_command("Runtime.evaluate", Some(EvaluateParams::returning_value(script)))
                    .await?;
                Ok(result.result.value.unwrap_or(Value::Null))
            }
        }
    }

    // --- Capture ------------------------------------------------------------

    /// Capture a screenshot and write it to `path`; format is inferred from
    /// its extension. `full_page` captures the full scrollable page rather
    /// than just the viewport.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFileExtension`] for an unrecognized
    /// extension, [`CoreError::TopLevelTargetRequired`] if the browser
    /// returns no data (happens for iframe targets, which cannot render a
    /// standalone top-level capture), or propagates
    /// [`CoreError::Cdp`]/[`CoreError::Io`].
    pub async fn screenshot(&self, path: &std::path::Path, quality: Option<u8>, full_page: bool) -> Result<(), CoreError> {
        let extension = path.extension().and_then(std::ffi::OsStr::to_str).unwrap_or("");
        let format = ScreenshotFormat::from_extension(extension)
            .ok_or_else(|| CoreError::InvalidFileExtension(extension.to_string()))?;

        let result: CaptureScreenshotResult = self
            .connection
            .execute_command(
                "Page.captureScreenshot",
                Some(CaptureScreenshotParams {
                    format: Some(format),
                    quality,
                    capture_beyond_viewport: Some(full_page),
                    clip: None,
                }),
            )
            .await?;

        let data = result.data.ok_or(CoreError::TopLevelTargetRequired)?;
        use base64::{engine::general_purpose::STANDARD, Engine};
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| CoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Export the page as a PDF and write it to `path`.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`]/[`CoreError::Io`].
    pub async fn print_to_pdf(
        &self,
        path: &std::path::Path,
        landscape: bool,
        print_background: bool,
        display_header_footer: bool,
        scale: Option<f64>,
    ) -> Result<(), CoreError> {
        let result: PrintToPdfResult = self
            .connection
            .execute_command(
                "Page.printToPDF",
                Some(PrintToPdfParams {
                    print_background: Some(print_background),
                    landscape: Some(landscape),
                    display_header_footer: Some(display_header_footer),
                    scale,
                }),
            )
            .await?;

        use base64::{engine::general_purpose::STANDARD, Engine};
        let bytes = STANDARD
            .decode(result.data)
            .map_err(|e| CoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    // --- Cookies --------------------------------------------------------

    /// Cookies visible to this target, via `Network.getCookies`.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn get_cookies(&self) -> Result<Vec<Cookie>, CoreError> {
        let result: GetCookiesResult = self
            .connection
            .execute_command("Network.getCookies", Some(GetCookiesParams::default()))
            .await?;
        Ok(result.cookies)
    }

    /// Set cookies via `Network.setCookies`.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn set_cookies(&self, cookies: Vec<Cookie>) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>("Network.setCookies", Some(SetCookiesParams { cookies }))
            .await?;
        Ok(())
    }

    /// Clear every cookie visible to this target.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn clear_cookies(&self) -> Result<(), CoreError> {
        self.connection.execute_command::<(), Value>("Network.clearBrowserCookies", None).await?;
        Ok(())
    }

    // --- Emulation ----------------------------------------------------------

    /// Override this target's viewport via `Emulation.setDeviceMetricsOverride`.
    /// Pass `width = 0, height = 0` to clear the override.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn set_viewport(&self, width: i32, height: i32, device_scale_factor: f64, mobile: bool) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Emulation.setDeviceMetricsOverride",
                Some(SetDeviceMetricsOverrideParams {
                    width,
                    height,
                    device_scale_factor,
                    mobile,
                }),
            )
            .await?;
        Ok(())
    }

    /// Override this target's reported user agent via
    /// `Emulation.setUserAgentOverride`.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn set_user_agent(&self, user_agent: &str, accept_language: Option<String>) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Emulation.setUserAgentOverride",
                Some(SetUserAgentOverrideParams {
                    user_agent: user_agent.to_string(),
                    accept_language,
                }),
            )
            .await?;
        Ok(())
    }

    // --- Dialogs ----------------------------------------------------------

    /// Enable `Page` domain events, required for the dialog fast path and
    /// for `Page.fileChooserOpened`. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn enable_page_events(&self) -> Result<(), CoreError> {
        if self.page_events_enabled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("Page.enable", None).await?;
        Ok(())
    }

    /// Disable `Page` domain events. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn disable_page_events(&self) -> Result<(), CoreError> {
        if !self.page_events_enabled.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("Page.disable", None).await?;
        Ok(())
    }

    /// Enable `Runtime` domain events. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn enable_runtime_events(&self) -> Result<(), CoreError> {
        if self.runtime_events_enabled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("Runtime.enable", None).await?;
        Ok(())
    }

    /// Disable `Runtime` domain events. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn disable_runtime_events(&self) -> Result<(), CoreError> {
        if !self.runtime_events_enabled.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("Runtime.disable", None).await?;
        Ok(())
    }

    /// Enable `DOM` domain events. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn enable_dom_events(&self) -> Result<(), CoreError> {
        if self.dom_events_enabled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("DOM.enable", None).await?;
        Ok(())
    }

    /// Disable `DOM` domain events. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn disable_dom_events(&self) -> Result<(), CoreError> {
        if !self.dom_events_enabled.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("DOM.disable", None).await?;
        Ok(())
    }

    /// Enable `Page.setInterceptFileChooserDialog`, independent of any single
    /// [`Tab::expect_file_chooser`] call. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn enable_intercept_file_chooser_dialog(&self) -> Result<(), CoreError> {
        if self.file_chooser_intercept_enabled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection
            .execute_command::<_, Value>(
                "Page.setInterceptFileChooserDialog",
                Some(SetInterceptFileChooserDialogParams { enabled: true }),
            )
            .await?;
        Ok(())
    }

    /// Disable file chooser interception. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn disable_intercept_file_chooser_dialog(&self) -> Result<(), CoreError> {
        if !self.file_chooser_intercept_enabled.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection
            .execute_command::<_, Value>(
                "Page.setInterceptFileChooserDialog",
                Some(SetInterceptFileChooserDialogParams { enabled: false }),
            )
            .await?;
        Ok(())
    }

    /// Poll the connection's dialog slot until a `javascriptDialogOpening`
    /// event has been observed or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] if the slot's payload cannot be parsed.
    pub async fn wait_for_dialog(&self, timeout: Duration) -> Result<Option<JavascriptDialogOpeningEvent>, CoreError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(value) = self.connection.dialog_slot().await {
                return Ok(Some(serde_json::from_value(value).map_err(CdpError::from)?));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(READINESS_POLL_INTERVAL).await;
        }
    }

    /// Accept or dismiss the currently open dialog, clearing the dialog slot
    /// afterward.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn handle_dialog(&self, accept: bool, prompt_text: Option<String>) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>("Page.handleJavaScriptDialog", Some(HandleJavaScriptDialogParams { accept, prompt_text }))
            .await?;
        self.connection.clear_dialog_slot().await;
        Ok(())
    }

    // --- Fetch interception ----------------------------------------------

    /// Enable `Fetch` domain interception, optionally scoped to one URL
    /// glob/resource type, optionally including auth-challenge events.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn enable_fetch_events(
        &self,
        handle_auth: bool,
        url_pattern: Option<String>,
        resource_type: Option<String>,
    ) -> Result<(), CoreError> {
        if self.fetch_events_enabled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let params = if handle_auth {
            FetchEnableParams::with_auth_handling()
        } else {
            FetchEnableParams::with_pattern(url_pattern, resource_type)
        };
        self.connection.execute_command::<_, Value>("Fetch.enable", Some(params)).await?;
        Ok(())
    }

    /// Disable `Fetch` domain interception. Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn disable_fetch_events(&self) -> Result<(), CoreError> {
        if !self.fetch_events_enabled.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("Fetch.disable", None).await?;
        Ok(())
    }

    // --- Network log --------------------------------------------------------

    /// Enable `Network` domain events and start recording the last
    /// `capacity` requests into an in-memory ring buffer. Idempotent: a
    /// second call only updates `capacity`, it does not re-register
    /// callbacks.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn enable_network_events(&self, capacity: usize) -> Result<(), CoreError> {
        self.network_log.lock().capacity = capacity;
        if self.network_events_enabled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("Network.enable", None).await?;

        let log_for_request = self.network_log.clone();
        self.connection
            .register_callback(
                "Network.requestWillBeSent",
                Arc::new(move |params| {
                    let log = log_for_request.clone();
                    Box::pin(async move {
                        if let Ok(RequestWillBeSentEvent {
                            request_id,
                            request: Request { url, method },
                        }) = serde_json::from_value(params)
                        {
                            log.lock().push(NetworkLogEntry {
                                request_id,
                                url,
                                method,
                                status: None,
                                error: None,
                            });
                        }
                    })
                }),
            )
            .await;

        let log_for_response = self.network_log.clone();
        self.connection
            .register_callback(
                "Network.responseReceived",
                Arc::new(move |params| {
                    let log = log_for_response.clone();
                    Box::pin(async move {
                        if let Ok(ResponseReceivedEvent {
                            request_id,
                            response: Response { status },
                        }) = serde_json::from_value(params)
                        {
                            log.lock().update_status(&request_id, status);
                        }
                    })
                }),
            )
            .await;

        let log_for_failed = self.network_log.clone();
        self.connection
            .register_callback(
                "Network.loadingFailed",
                Arc::new(move |params| {
                    let log = log_for_failed.clone();
                    Box::pin(async move {
                        if let Ok(LoadingFailedEvent { request_id, error_text }) = serde_json::from_value(params) {
                            log.lock().mark_failed(&request_id, error_text);
                        }
                    })
                }),
            )
            .await;

        Ok(())
    }

    /// Disable `Network` domain events. Idempotent; leaves already-recorded
    /// entries in place.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn disable_network_events(&self) -> Result<(), CoreError> {
        if !self.network_events_enabled.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.connection.execute_command::<(), Value>("Network.disable", None).await?;
        Ok(())
    }

    /// Logged requests, oldest first, up to the configured capacity.
    /// When `filter` is given, only entries whose URL contains it are
    /// returned.
    #[must_use]
    pub fn get_network_logs(&self, filter: Option<&str>) -> Vec<NetworkLogEntry> {
        let log = self.network_log.lock();
        match filter {
            Some(filter) => log.entries.iter().filter(|e| e.url.contains(filter)).cloned().collect(),
            None => log.entries.iter().cloned().collect(),
        }
    }

    /// Fetch a completed response's body via `Network.getResponseBody`. Must
    /// be called within roughly 30 seconds of the response or the browser may
    /// have already discarded it.
    ///
    /// # Errors
    ///
    /// Propagates [`CoreError::Cdp`] on protocol failure.
    pub async fn get_network_response_body(&self, request_id: &str) -> Result<GetResponseBodyResult, CoreError> {
        Ok(self
            .connection
            .execute_command(
                "Network.getResponseBody",
                Some(GetResponseBodyParams {
                    request_id: request_id.to_string(),
                }),
            )
            .await?)
    }

    // --- Downloads ----------------------------------------------------------

    /// Arm download capture: install tab-independent `Browser`-scoped
    /// handlers and point `Browser.setDownloadBehavior` at a fresh temp
    /// directory. The returned guard must be kept alive until the triggering
    /// action (e.g. a click) has been issued and [`Download::done`] awaited;
    /// dropping it early unregisters the handlers and deletes the directory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TabClosed`] if the owning browser has already
    /// been dropped, or propagates [`CoreError::Cdp`]/[`CoreError::Io`].
    pub async fn expect_download(&self) -> Result<DownloadGuard, CoreError> {
        let browser = self.browser.upgrade().ok_or(CoreError::TabClosed)?;
        let temp_dir = Arc::new(tempfile::TempDir::with_prefix("devtool-download-")?);

        browser
            .set_download_behavior(
                devtool_cdp::protocol::browser::DownloadBehaviorKind::Allow,
                Some(&temp_dir.path().to_string_lossy()),
                self.browser_context_id.as_deref(),
            )
            .await?;

        Ok(download::install(&browser, self.browser_context_id.clone(), temp_dir).await)
    }

    // --- File chooser -------------------------------------------------------

    /// Intercept the next file chooser dialog opened while `trigger` runs,
    /// answering it with `files`. `trigger` is expected to cause the chooser
    /// to open, e.g. by clicking a `<label for=...>` or an
    /// `<input type="file">` element. Toggles interception for the scope of
    /// this call independently of [`Tab::enable_intercept_file_chooser_dialog`].
    ///
    /// # Errors
    ///
    /// Propagates whatever `trigger` returns, or [`CoreError::Cdp`] if
    /// interception setup or `Page.handleFileChooser` fails.
    pub async fn expect_file_chooser<F, Fut>(&self, files: Vec<String>, trigger: F) -> Result<(), CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), CoreError>>,
    {
        self.connection
            .execute_command::<_, Value>(
                "Page.setInterceptFileChooserDialog",
                Some(SetInterceptFileChooserDialogParams { enabled: true }),
            )
            .await?;

        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let connection_for_callback = self.connection.clone();
        self.connection
            .register_callback_once(
                "Page.fileChooserOpened",
                Arc::new(move |params| {
                    let connection = connection_for_callback.clone();
                    let files = files.clone();
                    let tx = tx.clone();
                    Box::pin(async move {
                        let _ = serde_json::from_value::<FileChooserOpenedEvent>(params);
                        let result = connection
                            .execute_command::<_, Value>("Page.handleFileChooser", Some(HandleFileChooserParams::accept(files)))
                            .await
                            .map_err(CoreError::from);
                        if let Some(sender) = tx.lock().take() {
                            let _ = sender.send(result);
                        }
                    })
                }),
            )
            .await;

        let trigger_result = trigger().await;

        let chooser_result = rx.await.unwrap_or_else(|_| Err(CoreError::Cdp(CdpError::ConnectionClosed)));

        self.connection
            .execute_command::<_, Value>(
                "Page.setInterceptFileChooserDialog",
                Some(SetInterceptFileChooserDialogParams { enabled: false }),
            )
            .await?;

        trigger_result?;
        chooser_result.map(|_| ())
    }

    // --- Frames -------------------------------------------------------------

    /// Resolve an `<iframe>` element's `src` into the [`Tab`] for its
    /// content document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IFrameHasNoSrc`] if the element has no `src`,
    /// [`CoreError::IFrameTargetNotFound`] if no target matches it, or
    /// [`CoreError::TabClosed`] if the owning browser has already been
    /// dropped.
    pub async fn get_frame(&self, iframe: &WebElement) -> Result<Arc<Tab>, CoreError> {
        let src = iframe.src().ok_or(CoreError::IFrameHasNoSrc)?;
        let browser = self.browser.upgrade().ok_or(CoreError::TabClosed)?;
        let targets = browser.get_targets().await?;
        let target = targets
            .into_iter()
            .find(|t| t.target_type == "iframe" && t.url == src)
            .ok_or(CoreError::IFrameTargetNotFound)?;
        browser.adopt_target(target.target_id, target.browser_context_id).await
    }
}

impl Locator for Tab {
    fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    fn root_object_id(&self) -> Option<&str> {
        None
    }
}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("target_id", &self.target_id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `body` already reads as a function expression (`function...` or
/// an arrow form, optionally `async`), so `execute_script` can pass it
/// straight through to `functionDeclaration` instead of wrapping it in
/// another `function() { ... }` shell.
fn is_function_expression(body: &str) -> bool {
    let trimmed = body.trim_start();
    let trimmed = trimmed.strip_prefix("async").map_or(trimmed, str::trim_start);
    if trimmed.starts_with("function")
        && trimmed["function".len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_ident_char(c))
    {
        return true;
    }
    has_top_level_arrow(trimmed)
}

/// Whether `s` contains a `=>` that isn't nested inside parentheses and
/// isn't preceded by a statement boundary (`;` or `{`) at the top level,
/// i.e. `s` opens with an arrow function's parameter list.
fn has_top_level_arrow(s: &str) -> bool {
    let mut depth = 0i32;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ';' | '{' if depth == 0 => return false,
            '=' if depth == 0 && chars.peek() == Some(&'>') => return true,
            _ => {}
        }
    }
    false
}

/// Replace every identifier-boundary occurrence of `from` in `source` with
/// `to`, operating on `char`s so multi-byte UTF-8 source text is never split
/// mid-codepoint.
fn replace_bareword(source: &str, from: &str, to: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let from_chars: Vec<char> = from.chars().collect();
    let mut result = String::with_capacity(source.len());
    let mut i = 0;
    while i < chars.len() {
        let is_match = chars[i..].starts_with(from_chars.as_slice())
            && (i == 0 || !is_ident_char(chars[i - 1]))
            && !chars.get(i + from_chars.len()).is_some_and(|c| is_ident_char(*c));
        if is_match {
            result.push_str(to);
            i += from_chars.len();
        } else {
            result.push(chars[i]);
            i += 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_bareword_respects_identifier_boundaries() {
        assert_eq!(replace_bareword("argument.value", "argument", "this"), "this.value");
        assert_eq!(
            replace_bareword("argumentTwo + argument", "argument", "this"),
            "argumentTwo + this"
        );
        assert_eq!(replace_bareword("no match here", "argument", "this"), "no match here");
    }

    #[test]
    fn replace_bareword_is_utf8_safe() {
        assert_eq!(replace_bareword("caf\u{e9} argument", "argument", "this"), "caf\u{e9} this");
    }

    #[test]
    fn bare_statement_bodies_are_wrapped() {
        assert!(!is_function_expression("return this.tagName;"));
        assert!(!is_function_expression("argument.click()"));
    }

    #[test]
    fn function_and_arrow_forms_pass_through_unwrapped() {
        assert!(is_function_expression("function() { return this.tagName; }"));
        assert!(is_function_expression("function(x) { return x; }"));
        assert!(is_function_expression("async function() { return this.tagName; }"));
        assert!(is_function_expression("() => this.tagName"));
        assert!(is_function_expression("(x) => x.value"));
        assert!(is_function_expression("async (x) => x.value"));
        assert!(!is_function_expression("functionCall()"));
    }
}
