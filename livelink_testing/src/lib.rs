//! Test support for the `livelink` client.
//!
//! Provides a loopback [`MockServer`], a [`RecordingHandler`] that captures
//! every callback as an [`Event`], frame builders in [`frames`], and a
//! serialised `logtest` fixture in [`logging`].
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use livelink::client::LiveLinkClient;
//! use livelink_testing::{MockServer, RecordingHandler, frames};
//!
//! # async fn example() -> std::io::Result<()> {
//! let server = MockServer::start().await?;
//! let handler = Arc::new(RecordingHandler::new());
//! let client = LiveLinkClient::new(handler.clone());
//! client.connect(&server.address()).await.expect("connect");
//! server.push(frames::new_file("part.plasticity"));
//! handler.wait_for(2, Duration::from_secs(1)).await;
//! # Ok(())
//! # }
//! ```

pub mod frames;
pub mod logging;
pub mod recording;
pub mod server;

pub use logging::{LoggerHandle, logger};
pub use recording::{Event, RecordingHandler};
pub use server::MockServer;
