//! # devtool-core — browser automation core
//!
//! Browser process lifecycle, tab/target management, element location, and
//! element interaction, built directly on the Chrome DevTools Protocol (no
//! WebDriver intermediary). Each [`Browser`] owns its own CDP [`Connection`];
//! each [`Tab`] it opens dials a second, independent `Connection` straight at
//! that target's `webSocketDebuggerUrl` rather than multiplexing everything
//! through `Target.attachToTarget`/`sessionId`.
//!
//! This crate handles:
//! - Locating and launching a Chrome/Edge binary ([`process`])
//! - Browser-context isolation, proxy auth, and browser-scoped domains
//!   (cookies, permissions, window geometry) via [`Browser`]
//! - Per-target navigation, scripting, capture, and observation via [`Tab`]
//! - CSS/XPath/attribute element location via the [`locator::Locator`] trait
//! - Element interaction (click, type, screenshot, bounds) via [`WebElement`]
//!
//! ## Quick start
//!
//! ```no_run
//! use devtool_core::Browser;
//! use devtool_core::locator::{FindCriteria, Locator};
//!
//! # async fn example() -> Result<(), devtool_core::CoreError> {
//! let (_browser, tab) = Browser::chrome().headless(true).launch().await?;
//! tab.go_to("https://example.com", None).await?;
//!
//! let heading = tab.find(FindCriteria::new().tag_name("h1")).await?;
//! println!("{:?}", heading.first().map(|e| e.tag_name()));
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod element;
pub mod error;
pub mod locator;
pub mod process;
pub mod proxy;
pub mod tab;

pub use browser::{Browser, BrowserBuilder};
pub use element::{Bounds, WebElement};
pub use error::CoreError;
pub use locator::{FindCriteria, Locator, SearchMethod};
pub use proxy::ProxyCredentials;
pub use tab::{Download, DownloadGuard, DownloadProgress, DownloadState, NetworkLogEntry, Tab};
