//! CDP WebSocket connection management.
//!
//! A [`Connection`] owns exactly one WebSocket. Spec invariant: Browser and
//! each Tab each hold their own `Connection` over their own socket — there is
//! no session-id multiplexing of multiple targets over a shared transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::CdpError;
use crate::transport::{CdpMessage, CdpRequest};

pub mod command_registry;
pub mod event_registry;

pub use command_registry::CommandRegistry;
use command_registry::slot_closed_error;
pub use event_registry::{CallbackId, EventCallback, EventRegistry};

/// Default timeout for CDP commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// The CDP method name the connection watches to fill its dialog fast-path
/// slot (spec §4.3: "the Connection watches for `Page.javascriptDialogOpening`
/// events and stores the most recent one in a slot readable by Tab").
const DIALOG_OPENING_EVENT: &str = "Page.javascriptDialogOpening";

/// State that exists only while the socket is actually connected.
struct ActiveSocket {
    tx: mpsc::Sender<CdpRequest>,
    read_handle: JoinHandle<()>,
    write_handle: JoinHandle<()>,
}

/// A single WebSocket connection to a browser or a target within it.
///
/// Connects lazily: [`Connection::new`] does not touch the network.
/// The first call to [`Connection::execute_command`] (or
/// [`Connection::ensure_connected`]) dials `ws_url`. If the socket later
/// closes, the next command transparently reconnects.
pub struct Connection {
    ws_url: String,
    socket: Mutex<Option<ActiveSocket>>,
    commands: Arc<CommandRegistry>,
    events: Arc<EventRegistry>,
    dialog_slot: Arc<Mutex<Option<Value>>>,
    closed: AtomicBool,
}

impl Connection {
    /// Build a connection bound to `ws_url` without connecting yet.
    #[must_use]
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            socket: Mutex::new(None),
            commands: Arc::new(CommandRegistry::new()),
            events: Arc::new(EventRegistry::new()),
            dialog_slot: Arc::new(Mutex::new(None)),
            closed: AtomicBool::new(false),
        }
    }

    /// The WebSocket URL this connection dials.
    #[must_use]
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Dial the socket if not already connected.
    ///
    /// # Errors
    ///
    /// Returns [`CdpError::ConnectionFailed`] if the WebSocket handshake
    /// fails.
    #[instrument(level = "info", skip(self), fields(ws_url = %self.ws_url))]
    pub async fn ensure_connected(&self) -> Result<(), CdpError> {
        let mut socket = self.socket.lock().await;
        if let Some(active) = socket.as_ref() {
            if active.read_handle.is_finished() {
                debug!("stale socket detected, reconnecting");
                *socket = None;
            } else {
                return Ok(());
            }
        }

        info!("connecting to CDP WebSocket endpoint");
        let (ws_stream, response) = tokio_tungstenite::connect_async(&self.ws_url).await?;
        info!(status = %response.status(), "WebSocket connection established");
        self.closed.store(false, Ordering::SeqCst);

        let (write, read) = ws_stream.split();
        let (tx, rx) = mpsc::channel::<CdpRequest>(64);

        let write_handle = tokio::spawn(Self::write_loop(rx, write));
        let read_handle = tokio::spawn(Self::read_loop(
            read,
            self.commands.clone(),
            self.events.clone(),
            self.dialog_slot.clone(),
        ));

        *socket = Some(ActiveSocket {
            tx,
            read_handle,
            write_handle,
        });
        Ok(())
    }

    /// Background task writing queued requests to the socket.
    async fn write_loop<S>(mut rx: mpsc::Receiver<CdpRequest>, mut sink: S)
    where
        S: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
    {
        while let Some(request) = rx.recv().await {
            let (id, method) = (request.id, request.method.clone());
            let json = match serde_json::to_string(&request) {
                Ok(j) => j,
                Err(e) => {
                    error!(error = %e, method = %method, "failed to serialize CDP request");
                    continue;
                }
            };

            trace!(id, method = %method, "sending CDP request");
            if sink.send(Message::Text(json.into())).await.is_err() {
                warn!("WebSocket sink closed, ending write loop");
                break;
            }
        }
        debug!("CDP write loop ended");
    }

    /// Background task reading frames, routing responses to
    /// [`CommandRegistry`] and events to [`EventRegistry`] — and, for the
    /// dialog fast path, directly into `dialog_slot`.
    async fn read_loop<S>(
        mut stream: S,
        commands: Arc<CommandRegistry>,
        events: Arc<EventRegistry>,
        dialog_slot: Arc<Mutex<Option<Value>>>,
    ) where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        while let Some(msg) = stream.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(frame)) => {
                    info!(?frame, "WebSocket closed by remote");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "WebSocket error, ending read loop");
                    break;
                }
                Ok(_) => continue,
            };

            let parsed: CdpMessage = match serde_json::from_str(&text) {
                Ok(m) => m,
                Err(e) => {
                    error!(error = %e, "failed to parse CDP message");
                    continue;
                }
            };

            match parsed {
                CdpMessage::Response(response) => {
                    let id = response.id;
                    if !commands.resolve(response).await {
                        trace!(id, "response for an id nobody is waiting on anymore");
                    }
                }
                CdpMessage::Event(event) => {
                    if event.method == DIALOG_OPENING_EVENT {
                        *dialog_slot.lock().await =
                            Some(event.params.clone().unwrap_or(Value::Null));
                    }

                    let callbacks = events.drain_for_dispatch(&event.method).await;
                    for callback in callbacks {
                        let params = event.params.clone().unwrap_or(Value::Null);
                        tokio::spawn(async move {
                            callback(params).await;
                        });
                    }
                }
            }
        }
        commands.cancel_all().await;
        debug!("CDP read loop ended");
    }

    /// Send a command with [`DEFAULT_COMMAND_TIMEOUT`] and decode the result.
    ///
    /// # Errors
    ///
    /// See [`Connection::execute_command_with_timeout`].
    pub async fn execute_command<P, R>(&self, method: &str, params: Option<P>) -> Result<R, CdpError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.execute_command_with_timeout(method, params, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Send a CDP command and await its response.
    ///
    /// # Errors
    ///
    /// Returns [`CdpError::ConnectionFailed`] if dialing fails,
    /// [`CdpError::Timeout`] if no response arrives within `timeout_duration`,
    /// [`CdpError::Protocol`] if the browser replies with an `error` object,
    /// and [`CdpError::Json`] if params/result (de)serialization fails.
    #[instrument(level = "debug", skip(self, params), fields(method = %method))]
    pub async fn execute_command_with_timeout<P, R>(
        &self,
        method: &str,
        params: Option<P>,
        timeout_duration: Duration,
    ) -> Result<R, CdpError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.ensure_connected().await?;

        let params_value = params.map(serde_json::to_value).transpose()?;
        let (id, receiver) = self.commands.create().await;

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: params_value,
        };

        let tx = {
            let socket = self.socket.lock().await;
            socket
                .as_ref()
                .ok_or(CdpError::ConnectionClosed)?
                .tx
                .clone()
        };
        if tx.send(request).await.is_err() {
            self.commands.cancel(id).await;
            return Err(CdpError::ConnectionClosed);
        }

        let response = match timeout(timeout_duration, receiver).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(slot_closed_error()),
            Err(_) => {
                self.commands.cancel(id).await;
                warn!(id, method = %method, "CDP command timed out");
                return Err(CdpError::Timeout(timeout_duration));
            }
        };

        if let Some(error) = response.error {
            return Err(CdpError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        let result = response.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(CdpError::from)
    }

    /// Subscribe `callback` to every `event_name` frame received.
    pub async fn register_callback(
        &self,
        event_name: impl Into<String>,
        callback: EventCallback,
    ) -> CallbackId {
        self.events.register(event_name, callback, false).await
    }

    /// Subscribe `callback` to the next `event_name` frame only.
    pub async fn register_callback_once(
        &self,
        event_name: impl Into<String>,
        callback: EventCallback,
    ) -> CallbackId {
        self.events.register(event_name, callback, true).await
    }

    /// Unregister a previously registered callback.
    pub async fn remove_callback(&self, id: CallbackId) -> bool {
        self.events.remove(id).await
    }

    /// Drop every registered callback.
    pub async fn clear_callbacks(&self) {
        self.events.clear().await;
    }

    /// Read, without clearing, the most recent `Page.javascriptDialogOpening`
    /// event payload.
    pub async fn dialog_slot(&self) -> Option<Value> {
        self.dialog_slot.lock().await.clone()
    }

    /// Clear the dialog slot, e.g. after the dialog has been handled.
    pub async fn clear_dialog_slot(&self) {
        *self.dialog_slot.lock().await = None;
    }

    /// Send a CDP-level ping by issuing `Browser.getVersion`, the cheapest
    /// command every target supports.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as
    /// [`Connection::execute_command`].
    pub async fn ping(&self) -> Result<(), CdpError> {
        self.execute_command::<(), Value>("Browser.getVersion", None)
            .await?;
        Ok(())
    }

    /// Close the socket and cancel every in-flight command.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(active) = self.socket.lock().await.take() {
            active.read_handle.abort();
            active.write_handle.abort();
        }
        self.commands.cancel_all().await;
        self.events.clear().await;
    }

    /// Whether [`Connection::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("ws_url", &self.ws_url)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
