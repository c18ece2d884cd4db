//! Metric helpers for `livelink`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking open sessions.
pub const CONNECTIONS_ACTIVE: &str = "livelink_connections_active";
/// Name of the counter tracking frames sent and received.
pub const FRAMES_TOTAL: &str = "livelink_frames_total";
/// Name of the counter tracking inbound frames dropped as malformed.
pub const FRAMES_DROPPED: &str = "livelink_frames_dropped_total";
/// Name of the counter tracking replies with a non-success status.
pub const REPLIES_FAILED: &str = "livelink_replies_failed_total";

/// Direction of a frame relative to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frames received from the server.
    Inbound,
    /// Commands sent to the server.
    Outbound,
}

impl Direction {
    /// Label value recorded for this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the open sessions gauge.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement the open sessions gauge.
pub fn dec_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_TOTAL, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an inbound frame dropped because it failed to decode.
pub fn inc_frames_dropped() {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_DROPPED).increment(1);
}

/// Record a reply that carried a non-success status.
pub fn inc_replies_failed() {
    #[cfg(feature = "metrics")]
    counter!(REPLIES_FAILED).increment(1);
}
