//! Synchronous facade over [`LiveLinkClient`] for hosts without a Tokio
//! runtime.
//!
//! [`BlockingClient`] starts one OS thread running a current-thread runtime
//! and a `LocalSet`. The async client lives on that thread; every method
//! forwards a job to it and parks the caller until the job completes. Jobs
//! run as separate local tasks, so [`BlockingClient::disconnect`] called from
//! another thread abandons a [`BlockingClient::connect`] that is still in its
//! handshake. Handler callbacks run on the worker thread, never on the
//! caller's.
//!
//! The methods must not be called from inside an async context: they block
//! the calling thread.

use std::{
    io,
    rc::Rc,
    sync::Arc,
    thread::{self, JoinHandle},
};

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::{self, LocalSet},
};
use tracing::{debug, warn};

use crate::{
    client::{
        ClientConfig,
        ClientError,
        CommandOutcome,
        ConnectionState,
        LiveLinkClient,
        ReportLevel,
        SceneHandler,
        SessionSnapshot,
    },
    command::{Command, RefacetOptions},
};

const WORKER_NAME: &str = "livelink-worker";

enum Job {
    Connect {
        address: String,
        respond_to: oneshot::Sender<Result<(), ClientError>>,
    },
    Send {
        command: Command,
        respond_to: oneshot::Sender<Result<CommandOutcome, ClientError>>,
    },
    Disconnect {
        respond_to: oneshot::Sender<()>,
    },
}

/// Blocking handle to a live-link session.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use livelink::{blocking::BlockingClient, client::NoopHandler};
///
/// # fn main() -> Result<(), livelink::client::ClientError> {
/// let client = BlockingClient::new(Arc::new(NoopHandler))?;
/// client.connect("localhost:8980")?;
/// client.subscribe_all()?;
/// client.disconnect();
/// # Ok(())
/// # }
/// ```
pub struct BlockingClient {
    jobs: Option<mpsc::UnboundedSender<Job>>,
    snapshot: watch::Receiver<SessionSnapshot>,
    handler: Arc<dyn SceneHandler>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for BlockingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingClient")
            .field("snapshot", &*self.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

impl BlockingClient {
    /// Start the worker thread with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Runtime`] if the thread or its runtime cannot
    /// be created.
    pub fn new<H: SceneHandler + 'static>(handler: Arc<H>) -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::default(), handler)
    }

    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Runtime`] if the thread or its runtime cannot
    /// be created.
    pub fn with_config<H: SceneHandler + 'static>(
        config: ClientConfig,
        handler: Arc<H>,
    ) -> Result<Self, ClientError> {
        let client = LiveLinkClient::with_config(config, Arc::clone(&handler));
        let snapshot = client.watch();
        let (jobs, receiver) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_owned())
            .spawn(move || run_worker(client, receiver, ready_tx))
            .map_err(ClientError::Runtime)?;

        match ready_rx.blocking_recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                let _ = worker.join();
                return Err(ClientError::Runtime(err));
            }
            Err(_) => {
                let _ = worker.join();
                return Err(ClientError::Runtime(io::Error::other(
                    "worker thread exited before starting",
                )));
            }
        }

        Ok(Self {
            jobs: Some(jobs),
            snapshot,
            handler,
            worker: Some(worker),
        })
    }

    /// Copy of the current session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot { self.snapshot.borrow().clone() }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState { self.snapshot.borrow().state }

    /// Connect and block until the handshake completes or fails.
    ///
    /// # Errors
    ///
    /// See [`LiveLinkClient::connect`]. Returns [`ClientError::Disconnected`]
    /// if the worker thread has stopped.
    pub fn connect(&self, address: &str) -> Result<(), ClientError> {
        let (respond_to, response) = oneshot::channel();
        self.submit(Job::Connect {
            address: address.to_owned(),
            respond_to,
        })?;
        response
            .blocking_recv()
            .map_err(|_| ClientError::Disconnected)?
    }

    /// Close the session, or abandon a handshake another thread is waiting
    /// on, and block until the handler has been notified.
    pub fn disconnect(&self) {
        let (respond_to, response) = oneshot::channel();
        if self.submit(Job::Disconnect { respond_to }).is_ok() && response.blocking_recv().is_err() {
            debug!("worker stopped during disconnect");
        }
    }

    /// Send `command` and block until it is written or skipped.
    ///
    /// # Errors
    ///
    /// See [`LiveLinkClient::send`].
    pub fn send(&self, command: Command) -> Result<CommandOutcome, ClientError> {
        let (respond_to, response) = oneshot::channel();
        self.submit(Job::Send {
            command,
            respond_to,
        })?;
        response
            .blocking_recv()
            .map_err(|_| ClientError::Disconnected)?
    }

    /// Request every object in the open file.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn list_all(&self) -> Result<CommandOutcome, ClientError> { self.send(Command::ListAll) }

    /// Request visible objects only.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn list_visible(&self) -> Result<CommandOutcome, ClientError> { self.send(Command::ListVisible) }

    /// Request selected objects.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn list_some(&self, filename: &str, ids: &[u32]) -> Result<CommandOutcome, ClientError> {
        self.send(Command::ListSome {
            filename: filename.to_owned(),
            ids: ids.to_vec(),
        })
    }

    /// Subscribe to every change in the open file.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn subscribe_all(&self) -> Result<CommandOutcome, ClientError> { self.send(Command::SubscribeAll) }

    /// Cancel all subscriptions.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn unsubscribe_all(&self) -> Result<CommandOutcome, ClientError> {
        self.send(Command::UnsubscribeAll)
    }

    /// Subscribe to changes for selected objects.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn subscribe_some(&self, filename: &str, ids: &[u32]) -> Result<CommandOutcome, ClientError> {
        self.send(Command::SubscribeSome {
            filename: filename.to_owned(),
            ids: ids.to_vec(),
        })
    }

    /// Request new geometry for selected objects.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn refacet_some(
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
    }

    /// Pass a status message through to the handler on the caller's thread.
    pub fn report(&self, level: ReportLevel, message: &str) { self.handler.report(level, message); }

    fn submit(&self, job: Job) -> Result<(), ClientError> {
        self.jobs
            .as_ref()
            .ok_or(ClientError::Disconnected)?
            .send(job)
            .map_err(|_| ClientError::Disconnected)
    }
}

impl Drop for BlockingClient {
    fn drop(&mut self) {
        // Closing the queue lets the worker disconnect and exit.
        drop(self.jobs.take());
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.join().is_err() {
            warn!("livelink worker thread panicked");
        }
    }
}

fn run_worker(
    client: LiveLinkClient,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    ready: oneshot::Sender<io::Result<()>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    let local = LocalSet::new();
    local.block_on(&runtime, async move {
        let client = Rc::new(client);
        while let Some(job) = jobs.recv().await {
            // Each job is its own task so a disconnect can interrupt a
            // handshake that is still in flight.
            let client = Rc::clone(&client);
            task::spawn_local(async move { run_job(&client, job).await });
        }
        client.disconnect().await;
        debug!("livelink worker stopped");
    });
}

async fn run_job(client: &LiveLinkClient, job: Job) {
    match job {
        Job::Connect {
            address,
            respond_to,
        } => {
            let _ = respond_to.send(client.connect(&address).await);
        }
        Job::Send {
            command,
            respond_to,
        } => {
            let _ = respond_to.send(client.send(command).await);
        }
        Job::Disconnect { respond_to } => {
            client.disconnect().await;
            let _ = respond_to.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::TcpListener,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        client::SkipReason,
        codec::{RefacetBatch, Transaction},
    };

    #[derive(Default)]
    struct Counts {
        disconnects: AtomicUsize,
        reports: AtomicUsize,
    }

    impl SceneHandler for Counts {
        fn on_connect(&self) {}

        fn on_disconnect(&self) { self.disconnects.fetch_add(1, Ordering::SeqCst); }

        fn on_new_file(&self, _filename: &str) {}

        fn on_new_version(&self, _filename: &str, _version: u32) {}

        fn on_transaction(&self, _transaction: Transaction) {}

        fn on_list(&self, _transaction: Transaction) {}

        fn on_refacet(&self, _batch: RefacetBatch) {}

        fn report(&self, _level: ReportLevel, _message: &str) { self.reports.fetch_add(1, Ordering::SeqCst); }
    }

    #[test]
    fn commands_block_and_skip_while_idle() {
        let client = BlockingClient::new(Arc::new(Counts::default())).expect("worker starts");
        assert_eq!(
            client.subscribe_some("f", &[1, 2]).expect("no error"),
            CommandOutcome::Skipped(SkipReason::NotConnected)
        );
        assert_eq!(client.state(), ConnectionState::Idle);
    }

    #[test]
    fn refused_connection_returns_connect_error_and_disconnects_once() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let handler = Arc::new(Counts::default());
        let client = BlockingClient::new(handler.clone()).expect("worker starts");
        let err = client.connect(&addr.to_string()).expect_err("nothing is listening");

        assert!(matches!(err, ClientError::Connect(_)), "got {err:?}");
        assert_eq!(handler.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(client.state(), ConnectionState::Idle);
    }

    #[test]
    fn dropping_the_client_joins_the_worker() {
        let handler = Arc::new(Counts::default());
        let client = BlockingClient::new(handler.clone()).expect("worker starts");
        client.report(ReportLevel::Info, "hello");
        drop(client);

        assert_eq!(Arc::strong_count(&handler), 1);
        assert_eq!(handler.reports.load(Ordering::SeqCst), 1);
    }
}
