//! Error types for live-link client operations.

use std::{io, time::Duration};

use tokio_tungstenite::tungstenite;

use super::ConnectionState;
use crate::codec::EncodeError;

/// Errors emitted by [`crate::client::LiveLinkClient`].
///
/// Commands issued while disconnected, or with an empty id list, are not
/// errors; they resolve to [`crate::client::CommandOutcome::Skipped`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The operation is not legal in the current connection state.
    #[error("expected {expected} state, found {actual}")]
    InvalidState {
        /// State the operation requires.
        expected: ConnectionState,
        /// State the session was in.
        actual: ConnectionState,
    },
    /// The handshake did not finish within the configured budget.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    /// The handshake failed.
    #[error("connect failed: {0}")]
    Connect(#[source] tungstenite::Error),
    /// Writing to an open socket failed.
    #[error("transport error: {0}")]
    Transport(#[source] tungstenite::Error),
    /// A command could not be encoded.
    #[error("failed to encode command: {0}")]
    Encode(#[from] EncodeError),
    /// The session ended before the command completed.
    #[error("session closed before the command completed")]
    Disconnected,
    /// The server address could not be turned into a WebSocket request.
    #[error("invalid server address: {0}")]
    InvalidAddress(String),
    /// The blocking client could not start its runtime thread.
    #[error("failed to start client runtime: {0}")]
    Runtime(#[source] io::Error),
}
