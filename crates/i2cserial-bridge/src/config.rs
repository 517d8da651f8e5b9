use std::time::Duration;

use i2cserial_frame::{FrameConfig, VERSION_LEN};

/// Default wait for a bridge reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(52);

/// Default receive buffer capacity in bytes.
pub const DEFAULT_RECEIVE_CAPACITY: usize = 256;

/// Configuration for a bridge [`Connection`](crate::Connection).
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long a transaction waits for the bridge to finish. Also bounds the
    /// wait for an idle link before a transaction starts. Default: 52ms.
    pub timeout: Duration,
    /// How long recovery waits for the bridge to confirm a reset. Default: 52ms.
    pub recovery_timeout: Duration,
    /// Receive buffer capacity. Values below the 4-byte version reply are
    /// raised to it. Default: 256.
    pub receive_capacity: usize,
    /// Outgoing frame limits.
    pub frame: FrameConfig,
}

impl BridgeConfig {
    /// Receive capacity actually allocated for a connection.
    pub fn effective_receive_capacity(&self) -> usize {
        self.receive_capacity.max(VERSION_LEN)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            recovery_timeout: DEFAULT_TIMEOUT,
            receive_capacity: DEFAULT_RECEIVE_CAPACITY,
            frame: FrameConfig::default(),
        }
    }
}
