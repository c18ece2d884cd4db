//! A [`SceneHandler`] that records every callback.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use livelink::{
    client::{ReportLevel, SceneHandler},
    codec::{RefacetBatch, Transaction},
    message::MessageKind,
};
use tokio::sync::Notify;

/// One handler callback, with its arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// `on_connect`.
    Connect,
    /// `on_disconnect`.
    Disconnect,
    /// `on_new_file`.
    NewFile(String),
    /// `on_new_version`.
    NewVersion(String, u32),
    /// `on_transaction`.
    Transaction(Transaction),
    /// `on_list`.
    List(Transaction),
    /// `on_refacet`.
    Refacet(RefacetBatch),
    /// `report`.
    Report(ReportLevel, String),
    /// `on_request_failed`.
    RequestFailed {
        /// Kind of the failed request.
        kind: MessageKind,
        /// Echoed request id.
        request_id: u32,
        /// Reply status.
        status: u32,
    },
}

/// Handler that appends each callback to an in-memory log.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
    changed: Notify,
}

impl RecordingHandler {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Copy of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<Event> { self.lock().clone() }

    /// Remove and return every event recorded so far.
    pub fn take(&self) -> Vec<Event> { std::mem::take(&mut *self.lock()) }

    /// Number of recorded events equal to `event`.
    #[must_use]
    pub fn count(&self, event: &Event) -> usize { self.lock().iter().filter(|e| *e == event).count() }

    /// Wait until at least `n` events are recorded, or `timeout` elapses.
    ///
    /// Returns the events recorded when the wait ended.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> Vec<Event> {
        let wait = async {
            loop {
                let notified = self.changed.notified();
                if self.lock().len() >= n {
                    return;
                }
                notified.await;
            }
        };
        let _ = tokio::time::timeout(timeout, wait).await;
        self.events()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> { self.events.lock().unwrap_or_else(PoisonError::into_inner) }

    fn record(&self, event: Event) {
        self.lock().push(event);
        self.changed.notify_waiters();
    }
}

impl SceneHandler for RecordingHandler {
    fn on_connect(&self) { self.record(Event::Connect); }

    fn on_disconnect(&self) { self.record(Event::Disconnect); }

    fn on_new_file(&self, filename: &str) { self.record(Event::NewFile(filename.to_owned())); }

    fn on_new_version(&self, filename: &str, version: u32) {
        self.record(Event::NewVersion(filename.to_owned(), version));
    }

    fn on_transaction(&self, transaction: Transaction) { self.record(Event::Transaction(transaction)); }

    fn on_list(&self, transaction: Transaction) { self.record(Event::List(transaction)); }

    fn on_refacet(&self, batch: RefacetBatch) { self.record(Event::Refacet(batch)); }

    fn report(&self, level: ReportLevel, message: &str) { self.record(Event::Report(level, message.to_owned())); }

    fn on_request_failed(&self, kind: MessageKind, request_id: u32, status: u32) {
        self.record(Event::RequestFailed {
            kind,
            request_id,
            status,
        });
    }
}
