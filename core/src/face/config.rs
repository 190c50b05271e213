//! Face configuration

use std::time::Duration;

use crate::packet::{Name, MAX_PACKET_SIZE};

/// Configuration for a [`Face`](super::Face).
#[derive(Clone, Debug)]
pub struct FaceConfig {
    /// Upper bound, in octets, for one encoded packet in either
    /// direction. Default: 8800.
    pub max_packet_size: usize,

    /// How long a prefix-registration command waits for the forwarder's
    /// response before failing. Default: 10 seconds.
    pub command_timeout: Duration,

    /// Name prefix that registration commands are sent under.
    /// Default: `/localhost/rib`.
    pub command_prefix: Name,
}

impl Default for FaceConfig {
    fn default() -> Self {
        FaceConfig {
            max_packet_size: MAX_PACKET_SIZE,
            command_timeout: Duration::from_secs(10),
            command_prefix: Name::from("/localhost/rib"),
        }
    }
}

impl FaceConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the packet size limit
    pub fn with_max_packet_size(mut self, octets: usize) -> Self {
        self.max_packet_size = octets;
        self
    }

    /// Set the registration-command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the registration-command prefix
    pub fn with_command_prefix(mut self, prefix: impl Into<Name>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    /// Configuration for testing (short command timeout)
    pub fn for_testing() -> Self {
        Self::default().with_command_timeout(Duration::from_millis(200))
    }
}
