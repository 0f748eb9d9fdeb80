//! Browser process lifecycle: spawning, port selection, and shutdown.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

use crate::error::CoreError;

/// Grace period given to the browser process before it is force-killed.
///
/// 3s, a middle-of-the-road figure that gives a headless Chromium enough
/// time to flush its profile without making `stop()` feel slow.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Flags always appended to keep a headless/automated session stable.
const STABILITY_ARGS: &[&str] = &[
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-component-update",
    "--disable-default-apps",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-hang-monitor",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-sync",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
];

/// How the launched browser's profile directory is managed.
#[derive(Debug, Clone)]
pub enum UserDataDir {
    /// A fresh temporary directory, removed when the browser stops.
    Temp,
    /// A temporary directory seeded by copying `template_path` first.
    TempFromTemplate(PathBuf),
    /// A caller-owned directory that persists across runs.
    Persist(PathBuf),
}

/// Reserve an ephemeral local TCP port for `--remote-debugging-port`.
///
/// Binds then immediately drops the listener; there is an unavoidable
/// race if something else grabs the port before Chromium does, the same
/// approach other zero-WebDriver launchers use.
///
/// # Errors
///
/// Returns [`CoreError::InvalidConnectionPort`] if no local port is
/// available to bind.
pub fn probe_free_port() -> Result<u16, CoreError> {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .map_err(|e| CoreError::InvalidConnectionPort(e.to_string()))
}

/// Materialize the user-data-dir policy into a concrete filesystem path.
///
/// Returns the path to pass as `--user-data-dir` and, for temp variants, the
/// [`TempDir`] guard that must outlive the browser process.
pub fn prepare_user_data_dir(
    policy: &UserDataDir,
) -> Result<(PathBuf, Option<TempDir>), CoreError> {
    match policy {
        UserDataDir::Temp => {
            let temp_dir = TempDir::with_prefix("devtool-profile-")?;
            let path = temp_dir.path().to_path_buf();
            Ok((path, Some(temp_dir)))
        }
        UserDataDir::TempFromTemplate(template_path) => {
            let temp_dir = TempDir::with_prefix("devtool-profile-")?;
            let dest = temp_dir.path().to_path_buf();
            copy_dir_recursive(template_path, &dest)?;
            Ok((dest, Some(temp_dir)))
        }
        UserDataDir::Persist(path) => Ok((path.clone(), None)),
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Owns the spawned browser child process.
#[derive(Debug)]
pub struct ProcessManager {
    child: Child,
    _temp_dir: Option<TempDir>,
}

impl ProcessManager {
    /// Spawn `binary_path` with `--remote-debugging-port=<port>`,
    /// `--user-data-dir=<profile>`, the stability flags, and `extra_args`
    /// appended last so the caller can override anything above.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BrowserBinaryNotFound`] if the binary cannot be
    /// spawned, or [`CoreError::Io`]/[`CoreError::InvalidConnectionPort`] if
    /// profile or port setup fails.
    #[instrument(level = "info", skip(extra_args), fields(port))]
    pub fn start(
        binary_path: &Path,
        port: u16,
        user_data_dir: &UserDataDir,
        extra_args: &[String],
    ) -> Result<Self, CoreError> {
        let (profile_path, temp_dir) = prepare_user_data_dir(user_data_dir)?;

        let mut command = Command::new(binary_path);
        command
            .arg(format!("--remote-debugging-port={port}"))
            .arg(format!("--user-data-dir={}", profile_path.display()))
            .args(STABILITY_ARGS)
            .args(extra_args)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        info!(binary = %binary_path.display(), port, "spawning browser process");
        let child = command
            .spawn()
            .map_err(|_| CoreError::BrowserBinaryNotFound)?;

        Ok(Self {
            child,
            _temp_dir: temp_dir,
        })
    }

    /// Process id of the running child.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Terminate the process: poll for up to [`SHUTDOWN_GRACE_PERIOD`] in
    /// case it exits on its own, then force-kill and reap.
    #[instrument(level = "info", skip(self), fields(pid = self.pid()))]
    pub async fn stop(&mut self) {
        if self.child.try_wait().ok().flatten().is_some() {
            debug!("browser process already exited");
            return;
        }

        const POLL_INTERVAL: Duration = Duration::from_millis(100);
        let mut waited = Duration::ZERO;
        while waited < SHUTDOWN_GRACE_PERIOD {
            if self.child.try_wait().ok().flatten().is_some() {
                debug!("browser process exited during grace period");
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            waited += POLL_INTERVAL;
        }

        kill_and_reap_async(&mut self.child).await;
    }
}

/// Kill and reap a child process, awaiting its exit status.
///
/// Reaping (calling `wait`) is required to avoid leaving a zombie process
/// behind once the child has been killed.
pub async fn kill_and_reap_async(child: &mut Child) {
    let _ = child.kill();
    match child.wait() {
        Ok(status) => info!(?status, "browser process reaped"),
        Err(e) => warn!(error = %e, "failed to reap browser process"),
    }
}

impl Drop for ProcessManager {
    fn drop(&mut self) {
        if self.child.try_wait().ok().flatten().is_some() {
            return;
        }
        let _ = self.child.kill();
        for _ in 0..5 {
            match self.child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                Err(_) => return,
            }
        }
        warn!(pid = self.pid(), "browser process still running after Drop kill attempt");
    }
}

#[cfg(test)]
mod tests;
