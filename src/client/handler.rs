//! Callback contract between the session and the host application.
//!
//! The session decodes frames on its worker task and hands each result to a
//! [`SceneHandler`]. Callbacks run on that task, one at a time, in frame
//! order; a slow handler delays the next frame.

use std::fmt;

use crate::{
    codec::{RefacetBatch, Transaction},
    message::MessageKind,
};

/// Severity passed through [`SceneHandler::report`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportLevel {
    /// Informational status.
    Info,
    /// Something the user should look at.
    Warning,
    /// An operation failed.
    Error,
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        })
    }
}

/// Receiver of decoded session events.
///
/// Every callback is invoked only after the frame it reports decoded in
/// full. [`on_disconnect`](Self::on_disconnect) fires exactly once per
/// connection attempt, whether the attempt failed, the server closed the
/// socket, or the caller disconnected.
pub trait SceneHandler: Send + Sync {
    /// The handshake completed and the session is open.
    fn on_connect(&self);

    /// The session ended or the connection attempt failed.
    fn on_disconnect(&self);

    /// The server opened `filename`.
    fn on_new_file(&self, filename: &str);

    /// The server saved `filename` at `version`.
    fn on_new_version(&self, filename: &str, version: u32);

    /// Incremental changes for a subscribed file.
    fn on_transaction(&self, transaction: Transaction);

    /// Full contents returned by a list request.
    fn on_list(&self, transaction: Transaction);

    /// Remeshed geometry for objects already known to the host.
    fn on_refacet(&self, batch: RefacetBatch);

    /// Host-facing status message.
    fn report(&self, level: ReportLevel, message: &str) {
        tracing::info!(%level, "{message}");
    }

    /// A list or refacet reply carried a non-success status.
    fn on_request_failed(&self, kind: MessageKind, request_id: u32, status: u32) {
        let _ = (kind, request_id, status);
    }
}

/// Handler that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl SceneHandler for NoopHandler {
    fn on_connect(&self) {}

    fn on_disconnect(&self) {}

    fn on_new_file(&self, _filename: &str) {}

    fn on_new_version(&self, _filename: &str, _version: u32) {}

    fn on_transaction(&self, _transaction: Transaction) {}

    fn on_list(&self, _transaction: Transaction) {}

    fn on_refacet(&self, _batch: RefacetBatch) {}
}
