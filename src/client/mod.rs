//! Async client for the live-link protocol.
//!
//! [`LiveLinkClient`] is a cheap handle around at most one open session.
//! Connecting performs the WebSocket handshake on the caller's task and then
//! hands the socket to a dedicated worker task, which owns it until the
//! session ends. Commands are queued to that worker and each call resolves
//! once its frame has been written, so callers never interleave writes or
//! race on the message-id counter.
//!
//! Session state is published through a `watch` channel; [`snapshot`]
//! returns a copy that may be stale by the time it is read.
//!
//! [`snapshot`]: LiveLinkClient::snapshot

use std::{fmt, sync::Arc};

use tokio::{
    sync::{Mutex, mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, handshake::client::Request as HandshakeRequest},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

mod config;
mod error;
mod handler;
mod session;

pub use config::{ClientConfig, DEFAULT_COMMAND_CAPACITY, DEFAULT_CONNECT_TIMEOUT};
pub use error::ClientError;
pub use handler::{NoopHandler, ReportLevel, SceneHandler};
use session::{Request, Session};

use crate::{
    command::{Command, RefacetOptions},
    metrics,
};

/// Lifecycle state of the client's session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No session; `connect` is allowed.
    #[default]
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Session open; commands are sent.
    Open,
    /// Local close in progress.
    Closing,
    /// The attempt or session failed; cleanup is running.
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Failed => "failed",
        })
    }
}

/// Point-in-time copy of the session state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Lifecycle state.
    pub state: ConnectionState,
    /// Address of the last connection attempt.
    pub address: Option<String>,
    /// Open file, as set by the last frame that named one.
    pub filename: Option<String>,
    /// Version of the open file, when the last such frame carried one.
    pub version: Option<u32>,
    /// Whether `subscribe_all` is in effect.
    pub subscribed: bool,
    /// Id of the last command sent; zero before the first.
    pub message_id: u32,
}

impl SessionSnapshot {
    /// Returns `true` while commands are being sent.
    #[must_use]
    pub fn is_open(&self) -> bool { self.state == ConnectionState::Open }
}

/// Why a command was not sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The session was not open.
    NotConnected,
    /// The command addresses objects but its id list was empty.
    NoIds,
}

/// Result of a command that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandOutcome {
    /// The frame was written with this message id.
    Sent {
        /// Id written into the frame.
        message_id: u32,
    },
    /// Nothing was written and no message id was used.
    Skipped(SkipReason),
}

impl CommandOutcome {
    /// Returns `true` if the frame was written.
    #[must_use]
    pub const fn is_sent(self) -> bool { matches!(self, Self::Sent { .. }) }

    /// Message id of a sent frame.
    #[must_use]
    pub const fn message_id(self) -> Option<u32> {
        match self {
            Self::Sent { message_id } => Some(message_id),
            Self::Skipped(_) => None,
        }
    }
}

struct SessionHandle {
    requests: mpsc::Sender<Request>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct PendingConnect {
    cancel: CancellationToken,
    /// Resolves once `connect` has finished its cleanup for this attempt.
    finished: oneshot::Receiver<()>,
}

enum Slot {
    Vacant,
    Connecting(PendingConnect),
    Active(SessionHandle),
}

/// Handle to a live-link session.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use livelink::client::{LiveLinkClient, NoopHandler};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), livelink::client::ClientError> {
/// let client = LiveLinkClient::new(Arc::new(NoopHandler));
/// client.connect("localhost:8980").await?;
/// client.list_all().await?;
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct LiveLinkClient {
    config: ClientConfig,
    handler: Arc<dyn SceneHandler>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    slot: Mutex<Slot>,
}

impl fmt::Debug for LiveLinkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveLinkClient")
            .field("config", &self.config)
            .field("snapshot", &*self.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

impl LiveLinkClient {
    /// Create a disconnected client with the default configuration.
    #[must_use]
    pub fn new<H: SceneHandler + 'static>(handler: Arc<H>) -> Self {
        Self::with_config(ClientConfig::default(), handler)
    }

    /// Create a disconnected client.
    #[must_use]
    pub fn with_config<H: SceneHandler + 'static>(config: ClientConfig, handler: Arc<H>) -> Self {
        Self {
            config,
            handler,
            snapshot: Arc::new(watch::Sender::new(SessionSnapshot::default())),
            slot: Mutex::new(Slot::Vacant),
        }
    }

    /// Configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig { &self.config }

    /// Copy of the current session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot { self.snapshot.borrow().clone() }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState { self.snapshot.borrow().state }

    /// Watch session state changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> { self.snapshot.subscribe() }

    /// Connect to `address` (`host:port` or a `ws://` URL) and start the
    /// session worker.
    ///
    /// On success the handler's `on_connect` has run and the message-id
    /// counter, filename and subscription flag are reset. On failure the
    /// handler's `on_disconnect` has run and the client is idle again; no
    /// retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidState`] unless the client is idle,
    /// [`ClientError::InvalidAddress`] for an unusable address,
    /// [`ClientError::ConnectTimeout`] or [`ClientError::Connect`] if the
    /// handshake fails, and [`ClientError::Disconnected`] if
    /// [`disconnect`](Self::disconnect) interrupts the handshake.
    pub async fn connect(&self, address: &str) -> Result<(), ClientError> {
        let request = websocket_request(address)?;
        let cancel = CancellationToken::new();
        let (finished, finished_rx) = oneshot::channel();
        {
            let mut slot = self.slot.lock().await;
            let actual = self.state();
            if actual != ConnectionState::Idle {
                return Err(ClientError::InvalidState {
                    expected: ConnectionState::Idle,
                    actual,
                });
            }
            *slot = Slot::Connecting(PendingConnect {
                cancel: cancel.clone(),
                finished: finished_rx,
            });
            self.snapshot.send_modify(|snapshot| {
                snapshot.state = ConnectionState::Connecting;
                snapshot.address = Some(address.to_owned());
            });
        }

        let span = info_span!("livelink.connect", address);
        let timeout = self.config.connect_timeout_value();
        let attempt = async {
            tokio::select! {
                () = cancel.cancelled() => Err(ClientError::Disconnected),
                result = tokio::time::timeout(timeout, connect_async(request)) => match result {
                    Err(_) => Err(ClientError::ConnectTimeout(timeout)),
                    Ok(Err(err)) => Err(ClientError::Connect(err)),
                    Ok(Ok((socket, _response))) => Ok(socket),
                },
            }
        }
        .instrument(span.clone())
        .await;

        let socket = match attempt {
            Ok(socket) => socket,
            Err(err) => {
                span.in_scope(|| warn!(error = %err, "connect failed"));
                *self.slot.lock().await = Slot::Vacant;
                let ending = if matches!(err, ClientError::Disconnected) {
                    ConnectionState::Closing
                } else {
                    ConnectionState::Failed
                };
                self.snapshot.send_modify(|snapshot| snapshot.state = ending);
                self.handler.on_disconnect();
                self.snapshot
                    .send_modify(|snapshot| snapshot.state = ConnectionState::Idle);
                let _ = finished.send(());
                return Err(err);
            }
        };

        let (requests, receiver) = mpsc::channel(self.config.command_capacity_value());
        self.snapshot.send_modify(|snapshot| {
            snapshot.state = ConnectionState::Open;
            snapshot.message_id = 0;
            snapshot.filename = None;
            snapshot.version = None;
            snapshot.subscribed = false;
        });
        metrics::inc_connections();
        span.in_scope(|| info!("connected"));
        self.handler.on_connect();

        let session = Session::new(
            socket,
            receiver,
            cancel.clone(),
            Arc::clone(&self.handler),
            Arc::clone(&self.snapshot),
            self.config.name_options(),
        );
        let task = tokio::spawn(session.run().instrument(span));
        {
            let mut slot = self.slot.lock().await;
            if matches!(*slot, Slot::Connecting(_)) {
                *slot = Slot::Active(SessionHandle {
                    requests,
                    cancel,
                    task,
                });
                return Ok(());
            }
        }

        // `disconnect` claimed the attempt as the handshake completed; the
        // token is already cancelled, so the worker is shutting down.
        if let Err(err) = task.await {
            warn!(error = %err, "session task ended abnormally");
        }
        let _ = finished.send(());
        Err(ClientError::Disconnected)
    }

    /// Close the session, or abandon a handshake in progress.
    ///
    /// Returns once the session or the interrupted connection attempt has
    /// finished its cleanup, including the handler's `on_disconnect`. Does
    /// nothing when already idle.
    pub async fn disconnect(&self) {
        let slot = std::mem::replace(&mut *self.slot.lock().await, Slot::Vacant);
        match slot {
            Slot::Vacant => debug!("disconnect while idle"),
            Slot::Connecting(pending) => {
                pending.cancel.cancel();
                if pending.finished.await.is_err() {
                    debug!("connect attempt dropped before cleanup");
                }
            }
            Slot::Active(handle) => {
                handle.cancel.cancel();
                if let Err(err) = handle.task.await {
                    warn!(error = %err, "session task ended abnormally");
                }
            }
        }
    }

    /// Queue `command` for the session worker and wait until it is written.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Disconnected`] if the session ends first,
    /// [`ClientError::Transport`] if the write fails, or
    /// [`ClientError::Encode`] if the command cannot be encoded.
    pub async fn send(&self, command: Command) -> Result<CommandOutcome, ClientError> {
        if self.state() != ConnectionState::Open {
            return Ok(CommandOutcome::Skipped(SkipReason::NotConnected));
        }
        if command.is_empty() {
            debug!(kind = %command.kind(), "skipping command with no ids");
            return Ok(CommandOutcome::Skipped(SkipReason::NoIds));
        }
        let requests = match &*self.slot.lock().await {
            Slot::Active(handle) => handle.requests.clone(),
            Slot::Vacant | Slot::Connecting(_) => {
                return Ok(CommandOutcome::Skipped(SkipReason::NotConnected));
            }
        };

        let (respond_to, response) = oneshot::channel();
        requests
            .send(Request {
                command,
                respond_to,
            })
            .await
            .map_err(|_| ClientError::Disconnected)?;
        response.await.map_err(|_| ClientError::Disconnected)?
    }

    /// Request every object in the open file.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn list_all(&self) -> Result<CommandOutcome, ClientError> { self.send(Command::ListAll).await }

    /// Request visible objects only.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn list_visible(&self) -> Result<CommandOutcome, ClientError> {
        self.send(Command::ListVisible).await
    }

    /// Request selected objects. Skipped when `ids` is empty.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn list_some(&self, filename: &str, ids: &[u32]) -> Result<CommandOutcome, ClientError> {
        self.send(Command::ListSome {
            filename: filename.to_owned(),
            ids: ids.to_vec(),
        })
        .await
    }

    /// Subscribe to every change in the open file.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn subscribe_all(&self) -> Result<CommandOutcome, ClientError> {
        self.send(Command::SubscribeAll).await
    }

    /// Cancel all subscriptions.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn unsubscribe_all(&self) -> Result<CommandOutcome, ClientError> {
        self.send(Command::UnsubscribeAll).await
    }

    /// Subscribe to changes for selected objects. Skipped when `ids` is
    /// empty.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn subscribe_some(&self, filename: &str, ids: &[u32]) -> Result<CommandOutcome, ClientError> {
        self.send(Command::SubscribeSome {
            filename: filename.to_owned(),
            ids: ids.to_vec(),
        })
        .await
    }

    /// Request new geometry for selected objects. Skipped when `ids` is
    /// empty.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn refacet_some(
        &self,
        filename: &str,
        ids: &[u32],
        options: RefacetOptions,
    ) -> Result<CommandOutcome, ClientError> {
        self.send(Command::RefacetSome {
            filename: filename.to_owned(),
            ids: ids.to_vec(),
            options,
        })
        .await
    }

    /// Pass a status message through to the handler.
    pub fn report(&self, level: ReportLevel, message: &str) { self.handler.report(level, message); }
}

impl Drop for LiveLinkClient {
    fn drop(&mut self) {
        match self.slot.get_mut() {
            Slot::Vacant => {}
            Slot::Connecting(pending) => pending.cancel.cancel(),
            Slot::Active(handle) => handle.cancel.cancel(),
        }
    }
}

/// Build the handshake request for `address`, adding `ws://` when no scheme
/// is given.
fn websocket_request(address: &str) -> Result<HandshakeRequest, ClientError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidAddress(address.to_owned()));
    }
    let url = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("ws://{trimmed}")
    };
    url.into_client_request()
        .map_err(|_| ClientError::InvalidAddress(address.to_owned()))
}
