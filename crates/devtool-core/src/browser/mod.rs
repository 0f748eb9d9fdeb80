//! Browser process lifecycle, target registry, and browser-context isolation.

mod chrome;
mod edge;

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use devtool_cdp::protocol::browser::{
    DownloadBehaviorKind, GetWindowForTargetParams, GetWindowForTargetResult,
    GrantPermissionsParams, ResetPermissionsParams, SetDownloadBehaviorParams, SetWindowBoundsParams,
    WindowBounds,
};
use devtool_cdp::protocol::fetch::{
    AuthChallengeResponse, AuthRequiredEvent, ContinueRequestParams, ContinueWithAuthParams,
    EnableParams as FetchEnableParams, RequestPausedEvent,
};
use devtool_cdp::protocol::network::Cookie;
use devtool_cdp::protocol::storage::{
    ClearCookiesParams, GetCookiesParams, GetCookiesResult, SetCookiesParams,
};
use devtool_cdp::protocol::target::{
    CreateBrowserContextParams, CreateBrowserContextResult, CreateTargetParams, CreateTargetResult,
    DisposeBrowserContextParams, GetTargetsParams, GetTargetsResult,
};
use devtool_cdp::{discover_websocket_url, wait_for_endpoint, CallbackId, Connection, EventCallback};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::CoreError;
use crate::process::{ProcessManager, UserDataDir, SHUTDOWN_GRACE_PERIOD};
use crate::proxy::{parse_proxy_url, ProxyAuthStore, DEFAULT_CONTEXT_KEY};
use crate::tab::Tab;

/// How long to wait for the browser's CDP endpoint to become reachable.
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Which browser binary family a [`BrowserBuilder`] resolves against.
///
/// The core treats Chrome and Edge identically once a binary is found;
/// this only changes *which* binary `find_executable` looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Product {
    Chrome,
    Edge,
}

impl Product {
    fn env_var(self) -> &'static str {
        match self {
            Product::Chrome => chrome::ENV_VAR,
            Product::Edge => edge::ENV_VAR,
        }
    }

    fn common_paths(self) -> &'static [&'static str] {
        match self {
            Product::Chrome => chrome::COMMON_PATHS,
            Product::Edge => edge::COMMON_PATHS,
        }
    }
}

/// Builder for launching a new browser process.
///
/// Obtained from [`Browser::chrome`] or [`Browser::edge`]; the two only
/// differ in which binary `launch` searches for.
#[derive(Debug, Clone)]
pub struct BrowserBuilder {
    product: Product,
    executable_path: Option<PathBuf>,
    headless: bool,
    args: Vec<String>,
    startup_timeout: Duration,
    user_data_dir: UserDataDir,
    proxy_server: Option<String>,
    proxy_bypass_list: Option<Vec<String>>,
}

impl BrowserBuilder {
    fn new(product: Product) -> Self {
        Self {
            product,
            executable_path: None,
            headless: true,
            args: Vec::new(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            user_data_dir: UserDataDir::Temp,
            proxy_server: None,
            proxy_bypass_list: None,
        }
    }

    /// Use an explicit binary instead of searching the environment/common
    /// paths.
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Run headless. Default `true`.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Append extra command-line arguments, after the stability flags.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// How long to wait for the CDP endpoint to become reachable.
    #[must_use]
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Persist the profile at `path` across runs.
    #[must_use]
    pub fn user_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_data_dir = UserDataDir::Persist(path.into());
        self
    }

    /// Seed a fresh temp profile by copying `template_path` first.
    #[must_use]
    pub fn user_data_dir_template_from(mut self, template_path: impl Into<PathBuf>) -> Self {
        self.user_data_dir = UserDataDir::TempFromTemplate(template_path.into());
        self
    }

    /// Route all traffic through `proxy_server` (`scheme://[user:pass@]host:port`).
    ///
    /// Any userinfo is parsed out and kept in the browser's [`ProxyAuthStore`]
    /// under [`DEFAULT_CONTEXT_KEY`]; it never reaches a CDP parameter or
    /// argument verbatim.
    #[must_use]
    pub fn proxy_server(mut self, proxy_server: impl Into<String>) -> Self {
        self.proxy_server = Some(proxy_server.into());
        self
    }

    /// Hosts that bypass `proxy_server`.
    #[must_use]
    pub fn proxy_bypass_list(mut self, hosts: Vec<String>) -> Self {
        self.proxy_bypass_list = Some(hosts);
        self
    }

    /// Find the configured binary without spawning it.
    fn find_executable(&self) -> Result<PathBuf, CoreError> {
        if let Some(path) = &self.executable_path {
            return if path.exists() {
                Ok(path.clone())
            } else {
                Err(CoreError::BrowserBinaryNotFound)
            };
        }

        if let Ok(path_str) = env::var(self.product.env_var()) {
            let path = PathBuf::from(path_str);
            if path.exists() {
                return Ok(path);
            }
        }

        for candidate in self.product.common_paths() {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
            if let Ok(output) = Command::new("which").arg(candidate).output() {
                if output.status.success() {
                    let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !found.is_empty() {
                        return Ok(PathBuf::from(found));
                    }
                }
            }
        }

        Err(CoreError::BrowserBinaryNotFound)
    }

    /// Spawn the browser, connect to it, and return its first open tab.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BrowserBinaryNotFound`] if no binary resolves,
    /// [`CoreError::FailedToStartBrowser`] if the CDP endpoint never becomes
    /// reachable within `startup_timeout`, or any error from
    /// [`Browser::bootstrap`].
    #[instrument(level = "info", skip(self), fields(headless = self.headless))]
    pub async fn launch(self) -> Result<(Arc<Browser>, Arc<Tab>), CoreError> {
        let binary = self.find_executable()?;
        let port = crate::process::probe_free_port()?;

        let mut args = Vec::new();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.args.clone());

        info!(binary = %binary.display(), port, "launching browser");
        let process = ProcessManager::start(&binary, port, &self.user_data_dir, &args)?;

        let ws_url = wait_for_endpoint(port, self.startup_timeout)
            .await
            .map_err(|e| CoreError::FailedToStartBrowser(e.to_string()))?;

        let connection = Arc::new(Connection::new(ws_url));
        Browser::bootstrap(
            connection,
            Some(process),
            self.proxy_server.as_deref(),
            self.proxy_bypass_list.clone(),
        )
        .await
    }
}

/// A browser instance: owns its process (if launched by us), a browser-scoped
/// [`Connection`], and the canonical target registry every [`Tab`] is looked
/// up through.
pub struct Browser {
    connection: Arc<Connection>,
    process: tokio::sync::Mutex<Option<ProcessManager>>,
    registry: tokio::sync::Mutex<HashMap<String, Arc<Tab>>>,
    creation_order: tokio::sync::Mutex<Vec<String>>,
    proxy_store: Arc<ProxyAuthStore>,
    fetch_auth_installed: AtomicBool,
}

impl Browser {
    /// Configure a launch of Google Chrome / Chromium.
    #[must_use]
    pub fn chrome() -> BrowserBuilder {
        BrowserBuilder::new(Product::Chrome)
    }

    /// Configure a launch of Microsoft Edge.
    #[must_use]
    pub fn edge() -> BrowserBuilder {
        BrowserBuilder::new(Product::Edge)
    }

    /// Attach to an already-running browser's CDP endpoint.
    ///
    /// `endpoint` may be the HTTP root (`http://host:port`) or a
    /// `ws://.../devtools/browser/...` URL directly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if discovery or the WebSocket handshake
    /// fails.
    #[instrument(level = "info")]
    pub async fn connect(endpoint: &str) -> Result<(Arc<Browser>, Arc<Tab>), CoreError> {
        let ws_url = discover_websocket_url(endpoint).await?;
        let connection = Arc::new(Connection::new(ws_url));
        Browser::bootstrap(connection, None, None, None).await
    }

    /// Shared bootstrap for `launch`/`connect`: discover the first page
    /// target, install global proxy-auth handlers if credentials were given,
    /// and build the initial [`Tab`].
    async fn bootstrap(
        connection: Arc<Connection>,
        process: Option<ProcessManager>,
        proxy_server: Option<&str>,
        proxy_bypass_list: Option<Vec<String>>,
    ) -> Result<(Arc<Browser>, Arc<Tab>), CoreError> {
        let proxy_store = Arc::new(ProxyAuthStore::new());

        if let Some(proxy_server) = proxy_server {
            let (credentials, sanitized) = parse_proxy_url(proxy_server);
            debug!(proxy = %sanitized, "configured proxy server");
            let _ = proxy_bypass_list;
            if let Some(credentials) = credentials {
                proxy_store.insert(DEFAULT_CONTEXT_KEY, credentials);
            }
        }

        let browser = Arc::new(Browser {
            connection,
            process: tokio::sync::Mutex::new(process),
            registry: tokio::sync::Mutex::new(HashMap::new()),
            creation_order: tokio::sync::Mutex::new(Vec::new()),
            proxy_store,
            fetch_auth_installed: AtomicBool::new(false),
        });

        if browser.proxy_store.get(DEFAULT_CONTEXT_KEY).is_some() {
            browser.install_global_proxy_auth().await?;
        }

        let targets: GetTargetsResult = browser
            .connection
            .execute_command("Target.getTargets", Some(GetTargetsParams::default()))
            .await?;
        let page_target = targets
            .target_infos
            .into_iter()
            .find(|t| t.target_type == "page")
            .ok_or_else(|| CoreError::FailedToStartBrowser("no page target found".to_string()))?;

        let tab = browser
            .adopt_target(page_target.target_id, page_target.browser_context_id)
            .await?;

        Ok((browser, tab))
    }

    /// Install Fetch interception on the browser-scoped connection to answer
    /// proxy auth challenges with the credentials stored under
    /// [`DEFAULT_CONTEXT_KEY`].
    async fn install_global_proxy_auth(&self) -> Result<(), CoreError> {
        if self.fetch_auth_installed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        install_proxy_auth_handlers(
            &self.connection,
            self.proxy_store.clone(),
            DEFAULT_CONTEXT_KEY.to_string(),
        )
        .await
    }

    /// WebSocket base (scheme + host + port) this browser's own connection
    /// dials, used to derive a per-target `Connection` URL.
    fn ws_base(&self) -> &str {
        let url = self.connection.ws_url();
        url.rsplit_once("/devtools/").map_or(url, |(base, _)| base)
    }

    /// Build (or return the existing) [`Tab`] for `target_id`, inserting it
    /// into the registry. Registry hit makes this idempotent: one `TargetId`
    /// always maps to one `Tab`.
    pub(crate) async fn adopt_target(
        self: &Arc<Self>,
        target_id: String,
        browser_context_id: Option<String>,
    ) -> Result<Arc<Tab>, CoreError> {
        let mut registry = self.registry.lock().await;
        if let Some(existing) = registry.get(&target_id) {
            return Ok(existing.clone());
        }

        let ws_url = format!("{}/devtools/page/{}", self.ws_base(), target_id);
        let connection = Arc::new(Connection::new(ws_url));
        let tab = Tab::new(
            connection,
            target_id.clone(),
            browser_context_id.clone(),
            Arc::downgrade(self),
        );

        if let Some(context_id) = browser_context_id.as_deref() {
            if let Some(credentials) = self.proxy_store.get(context_id) {
                tab.enable_proxy_auth(credentials).await?;
            }
        }

        registry.insert(target_id.clone(), tab.clone());
        drop(registry);
        self.creation_order.lock().await.push(target_id);
        Ok(tab)
    }

    /// Open a new tab, optionally inside an existing browser context.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if `Target.createTarget` fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn new_tab(
        self: &Arc<Self>,
        url: Option<&str>,
        browser_context_id: Option<&str>,
    ) -> Result<Arc<Tab>, CoreError> {
        let mut params = CreateTargetParams::new(url.unwrap_or("about:blank"));
        if let Some(context_id) = browser_context_id {
            params = params.in_context(context_id);
        }

        let result: CreateTargetResult = self
            .connection
            .execute_command("Target.createTarget", Some(params))
            .await?;

        self.adopt_target(result.target_id, browser_context_id.map(str::to_string))
            .await
    }

    /// Create an isolated browser context, optionally proxied. Returns the
    /// new context's id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if `Target.createBrowserContext` fails.
    #[instrument(level = "debug", skip(self, proxy_server))]
    pub async fn create_browser_context(
        &self,
        proxy_server: Option<&str>,
        proxy_bypass_list: Option<Vec<String>>,
    ) -> Result<String, CoreError> {
        let (credentials, sanitized_proxy) = match proxy_server {
            Some(url) => {
                let (creds, sanitized) = parse_proxy_url(url);
                (creds, Some(sanitized))
            }
            None => (None, None),
        };

        let result: CreateBrowserContextResult = self
            .connection
            .execute_command(
                "Target.createBrowserContext",
                Some(CreateBrowserContextParams {
                    proxy_server: sanitized_proxy,
                    proxy_bypass_list: proxy_bypass_list.map(|hosts| hosts.join(";")),
                }),
            )
            .await?;

        if let Some(credentials) = credentials {
            self.proxy_store
                .insert(result.browser_context_id.clone(), credentials);
        }

        Ok(result.browser_context_id)
    }

    /// Dispose of a browser context: close every tab registered under it and
    /// forget its stored proxy credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if `Target.disposeBrowserContext` fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_browser_context(&self, context_id: &str) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Target.disposeBrowserContext",
                Some(DisposeBrowserContextParams {
                    browser_context_id: context_id.to_string(),
                }),
            )
            .await?;

        let mut registry = self.registry.lock().await;
        let closing: Vec<String> = registry
            .iter()
            .filter(|(_, tab)| tab.browser_context_id().as_deref() == Some(context_id))
            .map(|(id, _)| id.clone())
            .collect();

        for target_id in &closing {
            if let Some(tab) = registry.remove(target_id) {
                tab.close().await;
            }
        }
        drop(registry);

        self.creation_order
            .lock()
            .await
            .retain(|id| !closing.contains(id));
        self.proxy_store.remove(context_id);
        Ok(())
    }

    /// Every currently known target, per `Target.getTargets`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn get_targets(&self) -> Result<Vec<devtool_cdp::protocol::target::TargetInfo>, CoreError> {
        let result: GetTargetsResult = self
            .connection
            .execute_command("Target.getTargets", Some(GetTargetsParams::default()))
            .await?;
        Ok(result.target_infos)
    }

    /// Every open tab, most recently created first.
    pub async fn get_opened_tabs(&self) -> Vec<Arc<Tab>> {
        let order = self.creation_order.lock().await;
        let registry = self.registry.lock().await;
        order
            .iter()
            .rev()
            .filter_map(|id| registry.get(id).cloned())
            .collect()
    }

    /// Browser-wide cookies via the `Storage` domain, optionally scoped to one
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn get_cookies(&self, context_id: Option<&str>) -> Result<Vec<Cookie>, CoreError> {
        let result: GetCookiesResult = self
            .connection
            .execute_command(
                "Storage.getCookies",
                Some(GetCookiesParams {
                    browser_context_id: context_id.map(str::to_string),
                }),
            )
            .await?;
        Ok(result.cookies)
    }

    /// Set cookies via `Storage.setCookies`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn set_cookies(
        &self,
        cookies: Vec<Cookie>,
        context_id: Option<&str>,
    ) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Storage.setCookies",
                Some(SetCookiesParams {
                    cookies,
                    browser_context_id: context_id.map(str::to_string),
                }),
            )
            .await?;
        Ok(())
    }

    /// Clear cookies via `Storage.clearCookies`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn clear_cookies(&self, context_id: Option<&str>) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Storage.clearCookies",
                Some(ClearCookiesParams {
                    browser_context_id: context_id.map(str::to_string),
                }),
            )
            .await?;
        Ok(())
    }

    /// Set download behavior via `Browser.setDownloadBehavior`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn set_download_behavior(
        &self,
        behavior: DownloadBehaviorKind,
        download_path: Option<&str>,
        context_id: Option<&str>,
    ) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Browser.setDownloadBehavior",
                Some(SetDownloadBehaviorParams {
                    behavior,
                    download_path: download_path.map(str::to_string),
                    browser_context_id: context_id.map(str::to_string),
                }),
            )
            .await?;
        Ok(())
    }

    /// Grant permissions via `Browser.grantPermissions`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn grant_permissions(
        &self,
        permissions: Vec<String>,
        origin: Option<&str>,
        context_id: Option<&str>,
    ) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Browser.grantPermissions",
                Some(GrantPermissionsParams {
                    permissions,
                    origin: origin.map(str::to_string),
                    browser_context_id: context_id.map(str::to_string),
                }),
            )
            .await?;
        Ok(())
    }

    /// Reset permissions via `Browser.resetPermissions`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn reset_permissions(&self, context_id: Option<&str>) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Browser.resetPermissions",
                Some(ResetPermissionsParams {
                    browser_context_id: context_id.map(str::to_string),
                }),
            )
            .await?;
        Ok(())
    }

    /// Current window geometry for the window containing `target_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn get_window_for_target(&self, target_id: &str) -> Result<GetWindowForTargetResult, CoreError> {
        Ok(self
            .connection
            .execute_command(
                "Browser.getWindowForTarget",
                Some(GetWindowForTargetParams {
                    target_id: target_id.to_string(),
                }),
            )
            .await?)
    }

    /// Resize/reposition a window via `Browser.setWindowBounds`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cdp`] if the command fails.
    pub async fn set_window_bounds(&self, window_id: i64, bounds: WindowBounds) -> Result<(), CoreError> {
        self.connection
            .execute_command::<_, Value>(
                "Browser.setWindowBounds",
                Some(SetWindowBoundsParams { window_id, bounds }),
            )
            .await?;
        Ok(())
    }

    /// Subscribe to a browser-scoped CDP event.
    pub async fn on(
        &self,
        event_name: impl Into<String>,
        callback: EventCallback,
        one_shot: bool,
    ) -> CallbackId {
        if one_shot {
            self.connection.register_callback_once(event_name, callback).await
        } else {
            self.connection.register_callback(event_name, callback).await
        }
    }

    /// Unregister a callback previously returned by [`Browser::on`].
    pub async fn remove_callback(&self, id: CallbackId) -> bool {
        self.connection.remove_callback(id).await
    }

    /// The browser-scoped connection, for commands `Tab` issues against the
    /// browser rather than its own target (e.g. `Target.closeTarget`).
    pub(crate) fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Stop every tab's connection, close the browser connection, and
    /// terminate the process (if we launched it) after the shutdown grace
    /// period.
    #[instrument(level = "info", skip(self))]
    pub async fn stop(&self) -> Result<(), CoreError> {
        let tabs: Vec<Arc<Tab>> = self.registry.lock().await.drain().map(|(_, t)| t).collect();
        for tab in tabs {
            tab.close().await;
        }
        self.connection.close().await;

        if let Some(mut process) = self.process.lock().await.take() {
            info!(grace = ?SHUTDOWN_GRACE_PERIOD, "stopping browser process");
            process.stop().await;
        } else {
            debug!("connected browser, not launched: nothing to terminate");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("ws_url", &self.connection.ws_url())
            .finish_non_exhaustive()
    }
}

/// Install the two handlers that answer proxy auth challenges on `connection`:
/// `Fetch.authRequired` provides the stored credentials for `context_key`,
/// and `Fetch.requestPaused` passes every other pause straight through. Both
/// are temporary: once an auth challenge has been answered with credentials
/// (successfully or not, so a misconfigured store doesn't pause every future
/// request forever), `Fetch` is disabled on `connection` and both callbacks
/// are removed, since the browser caches proxy auth for the life of the
/// underlying connection and does not need re-challenging per request.
pub(crate) async fn install_proxy_auth_handlers(
    connection: &Arc<Connection>,
    proxy_store: Arc<ProxyAuthStore>,
    context_key: String,
) -> Result<(), CoreError> {
    connection
        .execute_command::<_, Value>(
            "Fetch.enable",
            Some(FetchEnableParams::with_auth_handling()),
        )
        .await?;

    let callback_ids: Arc<parking_lot::Mutex<Vec<CallbackId>>> = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let pass_through = connection.clone();
    let request_paused_id = connection
        .register_callback(
            "Fetch.requestPaused",
            Arc::new(move |params| {
                let connection = pass_through.clone();
                Box::pin(async move {
                    if let Ok(event) = serde_json::from_value::<RequestPausedEvent>(params) {
                        let _ = connection
                            .execute_command::<_, Value>(
                                "Fetch.continueRequest",
                                Some(ContinueRequestParams {
                                    request_id: event.request_id,
                                    url: None,
                                }),
                            )
                            .await;
                    }
                })
            }),
        )
        .await;
    callback_ids.lock().push(request_paused_id);

    let auth_connection = connection.clone();
    let auth_callback_ids = callback_ids.clone();
    let auth_request_id = connection
        .register_callback(
            "Fetch.authRequired",
            Arc::new(move |params| {
                let connection = auth_connection.clone();
                let proxy_store = proxy_store.clone();
                let context_key = context_key.clone();
                let callback_ids = auth_callback_ids.clone();
                Box::pin(async move {
                    let Ok(event) = serde_json::from_value::<AuthRequiredEvent>(params) else {
                        return;
                    };
                    let response = match proxy_store.get(&context_key) {
                        Some(credentials) => {
                            AuthChallengeResponse::provide(credentials.username, credentials.password)
                        }
                        None => {
                            warn!(context = %context_key, "auth challenge with no stored credentials");
                            AuthChallengeResponse::cancel()
                        }
                    };
                    let _ = connection
                        .execute_command::<_, Value>(
                            "Fetch.continueWithAuth",
                            Some(ContinueWithAuthParams {
                                request_id: event.request_id,
                                auth_challenge_response: response,
                            }),
                        )
                        .await;

                    let ids = std::mem::take(&mut *callback_ids.lock());
                    for id in ids {
                        connection.remove_callback(id).await;
                    }
                    let _ = connection.execute_command::<(), Value>("Fetch.disable", None).await;
                })
            }),
        )
        .await;
    callback_ids.lock().push(auth_request_id);

    Ok(())
}

#[cfg(test)]
mod tests;
