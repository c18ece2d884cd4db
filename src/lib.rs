#![doc(html_root_url = "https://docs.rs/livelink/latest")]
//! Public API for the `livelink` library.
//!
//! This crate implements the client half of a CAD live-link bridge: a codec
//! for the little-endian scene protocol, a WebSocket session that decodes
//! server frames into handler callbacks, and the commands a client sends
//! back. A handler-side [`mirror`] keeps a local copy of the remote scene.

pub mod blocking;
pub mod byte_order;
pub mod client;
pub mod codec;
pub mod command;
pub mod message;
pub mod metrics;
pub mod mirror;

pub use blocking::BlockingClient;
pub use client::{
    ClientConfig,
    ClientError,
    CommandOutcome,
    ConnectionState,
    LiveLinkClient,
    NoopHandler,
    ReportLevel,
    SceneHandler,
    SessionSnapshot,
    SkipReason,
};
pub use codec::{DecodeError, EncodeError, InboundMessage, RefacetBatch, SceneObject, Transaction};
pub use command::{Command, RefacetOptions};
pub use message::{FacetShape, MessageKind, ObjectKind};
pub use metrics::{CONNECTIONS_ACTIVE, Direction, FRAMES_DROPPED, FRAMES_TOTAL, REPLIES_FAILED};
pub use mirror::{IdScope, MirrorHandler, SceneMirror};
