//! Download capture: `Browser.downloadWillBegin`/`downloadProgress` tracked
//! into a [`Download`] handle, cleaned up by [`DownloadGuard`] on drop.

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use devtool_cdp::protocol::browser::{DownloadBehaviorKind, DownloadProgressEvent, DownloadWillBeginEvent};
use devtool_cdp::CallbackId;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::watch;

use crate::browser::Browser;
use crate::error::CoreError;

/// Lifecycle state of a tracked download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Bytes are still arriving.
    InProgress,
    /// The file finished writing successfully.
    Completed,
    /// The browser or the user canceled the download.
    Canceled,
}

/// Byte counters reported by the most recent `Browser.downloadProgress` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadProgress {
    /// Bytes received so far.
    pub received_bytes: i64,
    /// Total bytes expected, or `-1` if unknown.
    pub total_bytes: i64,
}

#[derive(Debug, Clone)]
struct DownloadInfo {
    guid: String,
    url: String,
    suggested_filename: String,
}

/// A download in progress or finished, correlated by GUID once
/// `Browser.downloadWillBegin` fires.
pub struct Download {
    info: Arc<Mutex<Option<DownloadInfo>>>,
    state_rx: watch::Receiver<DownloadState>,
    progress_rx: watch::Receiver<DownloadProgress>,
    temp_dir: Arc<TempDir>,
}

impl Download {
    /// The download's GUID, once `Browser.downloadWillBegin` has fired.
    #[must_use]
    pub fn guid(&self) -> Option<String> {
        self.info.lock().as_ref().map(|i| i.guid.clone())
    }

    /// The URL the download was initiated from.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        self.info.lock().as_ref().map(|i| i.url.clone())
    }

    /// Chromium's suggested filename for the download.
    #[must_use]
    pub fn suggested_filename(&self) -> Option<String> {
        self.info.lock().as_ref().map(|i| i.suggested_filename.clone())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DownloadState {
        *self.state_rx.borrow()
    }

    /// Most recently reported byte counters.
    #[must_use]
    pub fn bytes(&self) -> DownloadProgress {
        *self.progress_rx.borrow()
    }

    /// Where the file is being (or was) written, once the GUID is known.
    /// Chromium names the on-disk file after the GUID, not
    /// `suggested_filename`.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        self.guid().map(|guid| self.temp_dir.path().join(guid))
    }

    /// Wait for the download to leave [`DownloadState::InProgress`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DownloadFailed`] if the browser reports
    /// `canceled`, or if the underlying event channel closes before a
    /// terminal state is observed (e.g. the browser connection dropped).
    pub async fn done(&mut self) -> Result<PathBuf, CoreError> {
        while *self.state_rx.borrow() == DownloadState::InProgress {
            if self.state_rx.changed().await.is_err() {
                return Err(CoreError::DownloadFailed("connection closed before completion".to_string()));
            }
        }
        match *self.state_rx.borrow() {
            DownloadState::Completed => self
                .file_path()
                .ok_or_else(|| CoreError::DownloadFailed("completed with no guid observed".to_string())),
            DownloadState::Canceled => Err(CoreError::DownloadFailed("canceled".to_string())),
            DownloadState::InProgress => unreachable!("loop only exits once state leaves InProgress"),
        }
    }
}

/// Owns [`Download`] plus the resources `Tab::expect_download` installed for
/// it: the temp download directory, the default-behavior restore, and the
/// two `Browser` event subscriptions. Cleans all three up when dropped,
/// since a synchronous `Drop` cannot `.await` the CDP calls directly; the
/// temp directory itself is removed by `TempDir`'s own synchronous `Drop`
/// once the last reference to it goes away.
pub struct DownloadGuard {
    download: Option<Download>,
    browser: Weak<Browser>,
    context_id: Option<String>,
    callback_ids: Vec<CallbackId>,
}

impl DownloadGuard {
    pub(crate) fn new(
        download: Download,
        browser: Weak<Browser>,
        context_id: Option<String>,
        callback_ids: Vec<CallbackId>,
    ) -> Self {
        Self {
            download: Some(download),
            browser,
            context_id,
            callback_ids,
        }
    }
}

impl Deref for DownloadGuard {
    type Target = Download;

    fn deref(&self) -> &Download {
        self.download.as_ref().expect("download present until guard drops")
    }
}

impl DerefMut for DownloadGuard {
    fn deref_mut(&mut self) -> &mut Download {
        self.download.as_mut().expect("download present until guard drops")
    }
}

impl Drop for DownloadGuard {
    fn drop(&mut self) {
        let browser = self.browser.clone();
        let context_id = self.context_id.clone();
        let callback_ids = std::mem::take(&mut self.callback_ids);
        tokio::spawn(async move {
            if let Some(browser) = browser.upgrade() {
                let _ = browser
                    .set_download_behavior(DownloadBehaviorKind::Default, None, context_id.as_deref())
                    .await;
                for id in callback_ids {
                    browser.remove_callback(id).await;
                }
            }
        });
    }
}

/// Install the `Browser.downloadWillBegin`/`downloadProgress` handlers for a
/// new capture and return the assembled [`DownloadGuard`]. The browser-side
/// `Browser.setDownloadBehavior` call is the caller's responsibility, since
/// it must happen before the guard exists to avoid a dropped-before-armed
/// race.
pub(crate) async fn install(
    browser: &Arc<Browser>,
    context_id: Option<String>,
    temp_dir: Arc<TempDir>,
) -> DownloadGuard {
    let info: Arc<Mutex<Option<DownloadInfo>>> = Arc::new(Mutex::new(None));
    let (state_tx, state_rx) = watch::channel(DownloadState::InProgress);
    let (progress_tx, progress_rx) = watch::channel(DownloadProgress::default());

    let info_for_begin = info.clone();
    let begin_id = browser
        .on(
            "Browser.downloadWillBegin",
            Arc::new(move |params| {
                let info = info_for_begin.clone();
                Box::pin(async move {
                    if let Ok(event) = serde_json::from_value::<DownloadWillBeginEvent>(params) {
                        *info.lock() = Some(DownloadInfo {
                            guid: event.guid,
                            url: event.url,
                            suggested_filename: event.suggested_filename,
                        });
                    }
                })
            }),
            true,
        )
        .await;

    let info_for_progress = info.clone();
    let progress_id = browser
        .on(
            "Browser.downloadProgress",
            Arc::new(move |params| {
                let info = info_for_progress.clone();
                let state_tx = state_tx.clone();
                let progress_tx = progress_tx.clone();
                Box::pin(async move {
                    let Ok(event) = serde_json::from_value::<DownloadProgressEvent>(params) else {
                        return;
                    };
                    let guid_matches = info.lock().as_ref().is_none_or(|i| i.guid == event.guid);
                    if !guid_matches {
                        return;
                    }
                    let _ = progress_tx.send(DownloadProgress {
                        received_bytes: event.received_bytes,
                        total_bytes: event.total_bytes,
                    });
                    let state = match event.state.as_str() {
                        "completed" => DownloadState::Completed,
                        "canceled" => DownloadState::Canceled,
                        _ => DownloadState::InProgress,
                    };
                    let _ = state_tx.send(state);
                })
            }),
            false,
        )
        .await;

    DownloadGuard::new(
        Download {
            info,
            state_rx,
            progress_rx,
            temp_dir,
        },
        Arc::downgrade(browser),
        context_id,
        vec![begin_id, progress_id],
    )
}
