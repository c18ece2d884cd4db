//! The socket-owning worker task.
//!
//! One [`Session`] runs per open connection. It alone reads from and writes
//! to the socket: inbound frames are decoded and dispatched to the handler,
//! and commands arrive over a bounded queue with a oneshot responder each.
//! Connection state lives in a `watch` channel that only this task writes
//! while the session is open.

use std::{sync::Arc, time::Duration};

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use super::{ClientError, CommandOutcome, ConnectionState, SceneHandler, SessionSnapshot, SkipReason};
use crate::{
    codec::{InboundMessage, NameOptions, decode_frame},
    command::{Command, encode_command},
    metrics::{self, Direction},
};

/// Upper bound on the closing handshake once the session is ending.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// A command waiting for the worker, with the channel its outcome goes to.
pub(super) struct Request {
    pub(super) command: Command,
    pub(super) respond_to: oneshot::Sender<Result<CommandOutcome, ClientError>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shutdown {
    /// Cancelled by the caller or the client handle was dropped.
    Local,
    /// The server closed the socket.
    Remote,
    /// Reading or writing the socket failed.
    Failed,
}

pub(super) struct Session<S> {
    socket: S,
    requests: mpsc::Receiver<Request>,
    cancel: CancellationToken,
    handler: Arc<dyn SceneHandler>,
    snapshot: Arc<watch::Sender<SessionSnapshot>>,
    options: NameOptions,
}

impl<S> Session<S>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
{
    pub(super) fn new(
        socket: S,
        requests: mpsc::Receiver<Request>,
        cancel: CancellationToken,
        handler: Arc<dyn SceneHandler>,
        snapshot: Arc<watch::Sender<SessionSnapshot>>,
        options: NameOptions,
    ) -> Self {
        Self {
            socket,
            requests,
            cancel,
            handler,
            snapshot,
            options,
        }
    }

    /// Serve the connection until it ends, then run the shared cleanup.
    pub(super) async fn run(mut self) {
        let reason = self.drive().await;
        self.finish(reason).await;
    }

    async fn drive(&mut self) -> Shutdown {
        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => return Shutdown::Local,

                request = self.requests.recv() => {
                    let Some(request) = request else {
                        return Shutdown::Local;
                    };
                    if !self.execute(request).await {
                        return Shutdown::Failed;
                    }
                }

                frame = self.socket.next() => match frame {
                    Some(Ok(message)) => {
                        if !self.receive(message) {
                            return Shutdown::Remote;
                        }
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "socket read failed");
                        return Shutdown::Failed;
                    }
                    None => return Shutdown::Remote,
                },
            }
        }
    }

    /// Run one command and answer its caller. Returns `false` once the
    /// socket can no longer be written.
    async fn execute(&mut self, request: Request) -> bool {
        let Request {
            command,
            respond_to,
        } = request;
        let outcome = self.send_command(&command).await;
        let alive = !matches!(outcome, Err(ClientError::Transport(_)));
        // The caller may have stopped waiting; the command was still sent.
        let _ = respond_to.send(outcome);
        alive
    }

    async fn send_command(&mut self, command: &Command) -> Result<CommandOutcome, ClientError> {
        let (state, last_id) = {
            let snapshot = self.snapshot.borrow();
            (snapshot.state, snapshot.message_id)
        };
        if state != ConnectionState::Open {
            return Ok(CommandOutcome::Skipped(SkipReason::NotConnected));
        }
        if command.is_empty() {
            return Ok(CommandOutcome::Skipped(SkipReason::NoIds));
        }

        let message_id = last_id.wrapping_add(1);
        let span = info_span!("livelink.command", kind = %command.kind(), message_id);
        let frame = encode_command(command, message_id)?;
        let len = frame.len();
        if let Err(err) = self
            .socket
            .send(Message::Binary(frame))
            .instrument(span.clone())
            .await
        {
            span.in_scope(|| warn!(error = %err, "command send failed"));
            return Err(ClientError::Transport(err));
        }

        self.snapshot.send_modify(|snapshot| {
            snapshot.message_id = message_id;
            if let Some(subscribed) = command.subscription() {
                snapshot.subscribed = subscribed;
            }
        });
        metrics::inc_frames(Direction::Outbound);
        span.in_scope(|| debug!(bytes = len, "command sent"));
        Ok(CommandOutcome::Sent { message_id })
    }

    /// Handle one socket message. Returns `false` when the server closed
    /// the session.
    fn receive(&self, message: Message) -> bool {
        match message {
            Message::Binary(frame) => {
                self.dispatch(&frame);
                true
            }
            Message::Text(text) => {
                warn!(bytes = text.len(), "ignoring unexpected text frame");
                true
            }
            Message::Close(frame) => {
                info!(?frame, "server closed the session");
                false
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => true,
        }
    }

    fn dispatch(&self, frame: &[u8]) {
        metrics::inc_frames(Direction::Inbound);
        let message = match decode_frame(frame, self.options) {
            Ok(message) => message,
            Err(err) => {
                info!(error = %err, bytes = frame.len(), "dropping malformed frame");
                metrics::inc_frames_dropped();
                return;
            }
        };

        if let Some(filename) = message.filename() {
            let version = message.version();
            self.snapshot.send_modify(|snapshot| {
                snapshot.filename = Some(filename.to_owned());
                snapshot.version = version;
            });
        }

        match message {
            InboundMessage::Transaction(transaction) => self.handler.on_transaction(transaction),
            InboundMessage::List { transaction, .. } => self.handler.on_list(transaction),
            InboundMessage::NewVersion { filename, version } => {
                self.handler.on_new_version(&filename, version);
            }
            InboundMessage::NewFile { filename } => self.handler.on_new_file(&filename),
            InboundMessage::Refacet { batch, .. } => self.handler.on_refacet(batch),
            InboundMessage::ReplyFailed { kind, header } => {
                warn!(
                    %kind,
                    request_id = header.request_id,
                    status = header.status,
                    "request failed"
                );
                metrics::inc_replies_failed();
                self.handler
                    .on_request_failed(kind, header.request_id, header.status);
            }
            InboundMessage::Ignored(kind) => debug!(%kind, "ignoring frame"),
        }
    }

    /// Cleanup shared by every way a session can end.
    async fn finish(mut self, reason: Shutdown) {
        let ending = match reason {
            Shutdown::Failed => ConnectionState::Failed,
            Shutdown::Local | Shutdown::Remote => ConnectionState::Closing,
        };
        self.snapshot.send_modify(|snapshot| snapshot.state = ending);

        match tokio::time::timeout(CLOSE_TIMEOUT, self.socket.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(error = %err, "closing handshake failed"),
            Err(_) => debug!("closing handshake timed out"),
        }

        self.requests.close();
        while let Ok(request) = self.requests.try_recv() {
            let _ = request.respond_to.send(Err(ClientError::Disconnected));
        }

        self.snapshot.send_modify(|snapshot| {
            snapshot.filename = None;
            snapshot.version = None;
            snapshot.subscribed = false;
        });
        metrics::dec_connections();
        info!(?reason, "disconnected");
        self.handler.on_disconnect();
        self.snapshot
            .send_modify(|snapshot| snapshot.state = ConnectionState::Idle);
    }
}
