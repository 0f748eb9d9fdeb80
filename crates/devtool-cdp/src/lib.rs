//! # devtool-cdp — Chrome DevTools Protocol transport
//!
//! Low-level Chrome DevTools Protocol (CDP) client over WebSocket. No
//! WebDriver intermediary, no session multiplexing: each [`Connection`]
//! dials exactly one target's `webSocketDebuggerUrl` and owns that socket
//! for its lifetime.
//!
//! This crate handles:
//! - HTTP discovery of a target's WebSocket debugger URL
//! - WebSocket dial, lazy-connect-on-first-command, reconnect-after-close
//! - CDP message (de)serialization
//! - Command/response correlation via [`connection::CommandRegistry`]
//! - Event subscription via [`connection::EventRegistry`], including
//!   one-shot handlers and the `Page.javascriptDialogOpening` fast path
//! - A typed [`protocol`] vocabulary for the CDP domains the core touches
//!
//! ## Quick start
//!
//! ```no_run
//! use devtool_cdp::{discover_websocket_url, Connection};
//! use devtool_cdp::protocol::target::GetTargetsResult;
//!
//! # async fn example() -> Result<(), devtool_cdp::CdpError> {
//! let ws_url = discover_websocket_url("http://localhost:9222").await?;
//! let conn = Connection::new(ws_url);
//!
//! let targets: GetTargetsResult = conn
//!     .execute_command("Target.getTargets", None::<()>)
//!     .await?;
//! for target in targets.target_infos {
//!     println!("{} {}", target.target_type, target.url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Subscribing to events
//!
//! ```no_run
//! use std::sync::Arc;
//! use devtool_cdp::Connection;
//!
//! # async fn example(conn: &Connection) {
//! conn.register_callback(
//!     "Page.loadEventFired",
//!     Arc::new(|_params| Box::pin(async { println!("page loaded") })),
//! )
//! .await;
//! # }
//! ```

pub mod connection;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod transport;

pub use connection::{CallbackId, CommandRegistry, Connection, EventCallback, EventRegistry};
pub use discovery::{discover_websocket_url, wait_for_endpoint};
pub use error::CdpError;
pub use transport::{CdpEvent, CdpMessage, CdpRequest, CdpResponse, CdpResponseError};
