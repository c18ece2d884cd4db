//! Loopback WebSocket server for driving a client end to end.
//!
//! [`MockServer`] accepts connections one at a time on `127.0.0.1`. Binary
//! frames the client sends are recorded in arrival order; frames queued with
//! [`MockServer::push`] are written to whichever connection is current, or
//! to the next one if none is.

use std::{io, net::SocketAddr, time::Duration};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{accept_async, tungstenite::Message};

enum Outbound {
    Frame(Message),
    Close,
    Abort,
}

/// Scripted live-link server.
pub struct MockServer {
    addr: SocketAddr,
    outbound: mpsc::UnboundedSender<Outbound>,
    inbound: mpsc::UnboundedReceiver<Bytes>,
    accepted: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Bind an ephemeral port and start accepting.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> io::Result<Self> { Self::start_with_handshake_delay(Duration::ZERO).await }

    /// Like [`start`](Self::start), but each accepted TCP connection waits
    /// `delay` before the WebSocket handshake is answered.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start_with_handshake_delay(delay: Duration) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (accepted_tx, accepted) = watch::channel(0);
        let task = tokio::spawn(serve(listener, delay, outbound_rx, inbound_tx, accepted_tx));
        Ok(Self {
            addr,
            outbound,
            inbound,
            accepted,
            task,
        })
    }

    /// Bound socket address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Address in the `host:port` form the client accepts.
    #[must_use]
    pub fn address(&self) -> String { self.addr.to_string() }

    /// Queue a binary frame.
    pub fn push(&self, frame: Bytes) { let _ = self.outbound.send(Outbound::Frame(Message::Binary(frame))); }

    /// Queue a text frame.
    pub fn push_text(&self, text: &str) { let _ = self.outbound.send(Outbound::Frame(Message::text(text))); }

    /// Close the current connection with a close frame.
    pub fn close(&self) { let _ = self.outbound.send(Outbound::Close); }

    /// Drop the current connection without a close frame.
    pub fn abort(&self) { let _ = self.outbound.send(Outbound::Abort); }

    /// Wait until `n` connections have completed the handshake.
    pub async fn wait_for_connections(&mut self, n: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.accepted.wait_for(|count| *count >= n))
            .await
            .is_ok_and(|result| result.is_ok())
    }

    /// Next binary frame the client sent, if one arrives within `timeout`.
    pub async fn next_frame(&mut self, timeout: Duration) -> Option<Bytes> {
        tokio::time::timeout(timeout, self.inbound.recv()).await.ok().flatten()
    }

    /// Every frame already received, without waiting.
    pub fn received(&mut self) -> Vec<Bytes> {
        std::iter::from_fn(|| self.inbound.try_recv().ok()).collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) { self.task.abort(); }
}

async fn serve(
    listener: TcpListener,
    handshake_delay: Duration,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    inbound: mpsc::UnboundedSender<Bytes>,
    accepted: watch::Sender<usize>,
) {
    while let Ok((stream, _)) = listener.accept().await {
        if !handshake_delay.is_zero() {
            tokio::time::sleep(handshake_delay).await;
        }
        let Ok(mut socket) = accept_async(stream).await else {
            continue;
        };
        accepted.send_modify(|count| *count += 1);

        loop {
            tokio::select! {
                message = socket.next() => match message {
                    Some(Ok(Message::Binary(frame))) => {
                        let _ = inbound.send(frame);
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                command = outbound.recv() => match command {
                    Some(Outbound::Frame(message)) => {
                        if socket.send(message).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close) => {
                        let _ = socket.close(None).await;
                        // Drain until the client acknowledges the close.
                        while let Some(Ok(_)) = socket.next().await {}
                        break;
                    }
                    Some(Outbound::Abort) => break,
                    None => return,
                },
            }
        }
    }
}
