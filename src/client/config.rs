//! Configuration for live-link clients.

use std::time::Duration;

use crate::codec::{DIGIT_PREFIX, NameOptions};

/// Default budget for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default depth of the command queue feeding the session worker.
pub const DEFAULT_COMMAND_CAPACITY: usize = 32;

/// Settings applied when a client connects.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use livelink::client::ClientConfig;
///
/// let config = ClientConfig::default()
///     .connect_timeout(Duration::from_millis(250))
///     .id_suffix(false);
/// assert_eq!(config.connect_timeout_value(), Duration::from_millis(250));
/// assert!(!config.name_options().id_suffix);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    connect_timeout: Duration,
    id_suffix: bool,
    command_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            id_suffix: true,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Set the handshake timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Append `_{id}` to object display names.
    #[must_use]
    pub fn id_suffix(mut self, enabled: bool) -> Self {
        self.id_suffix = enabled;
        self
    }

    /// Set the command queue depth. Values below one are raised to one.
    #[must_use]
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }

    /// Handshake timeout.
    #[must_use]
    pub const fn connect_timeout_value(&self) -> Duration { self.connect_timeout }

    /// Command queue depth.
    #[must_use]
    pub const fn command_capacity_value(&self) -> usize { self.command_capacity }

    /// Prefix applied to display names that start with a digit.
    #[must_use]
    pub const fn digit_prefix(&self) -> &'static str { DIGIT_PREFIX }

    /// Naming options passed to the object decoder.
    #[must_use]
    pub const fn name_options(&self) -> NameOptions {
        NameOptions {
            id_suffix: self.id_suffix,
        }
    }
}
