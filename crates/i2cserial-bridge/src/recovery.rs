//! Reset exchange and version handshake.

use std::fmt;
use std::time::Instant;

use i2cserial_frame::{FrameBuilder, VERSION_LEN};
use i2cserial_transport::SerialTransport;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::connection::{Connection, Plan};
use crate::error::{BridgeError, Result};
use crate::state::State;

/// Bridge firmware version, as four raw bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FirmwareVersion(pub [u8; VERSION_LEN]);

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

impl<T: SerialTransport> Connection<T> {
    /// Reset the bridge and wait for it to report idle.
    ///
    /// Does nothing when the link is already idle, so repeated calls are
    /// harmless.
    pub fn recover(&self) -> Result<()> {
        let mut builder = self.lock_txn();
        if self.state() == State::Idle {
            debug!("link idle, nothing to recover");
            return Ok(());
        }
        self.reset_exchange(&mut builder)
    }

    /// Send a reset and wait, bounded by the recovery timeout, for the
    /// bridge's reset marker.
    ///
    /// On timeout the link stays in `WaitingForWatchdog`; the next
    /// transaction forces it idle.
    pub(crate) fn reset_exchange(&self, builder: &mut FrameBuilder) -> Result<()> {
        let timeout = self.config().recovery_timeout;
        warn!(?timeout, "resetting bridge");

        self.shared().lock().await_watchdog();
        builder.clear().reset();
        self.transport().send(builder.finish()?)?;

        let (_link, idle) = self
            .shared()
            .wait_until(Instant::now() + timeout, |link| link.state() == State::Idle);
        if !idle {
            warn!("bridge did not confirm reset");
            return Err(BridgeError::Timeout(timeout));
        }
        info!("bridge reset confirmed");
        Ok(())
    }

    /// Ask the bridge for its firmware version.
    ///
    /// Anything short of a complete 4-byte reply means there is no working
    /// bridge on the line.
    pub(crate) fn request_version(&self) -> Result<FirmwareVersion> {
        let mut builder = self.lock_txn();
        builder.clear().version_request();

        let link = match self.execute(&mut builder, Plan::write()) {
            Ok(link) => link,
            Err(BridgeError::Transport(err)) => return Err(BridgeError::Transport(err)),
            Err(err) => return Err(BridgeError::NoDevice(format!("version request failed: {err}"))),
        };

        let received = link.received();
        let bytes: [u8; VERSION_LEN] = received
            .get(..VERSION_LEN)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| {
                BridgeError::NoDevice(format!(
                    "incomplete version reply ({} of {VERSION_LEN} bytes)",
                    received.len()
                ))
            })?;
        Ok(FirmwareVersion(bytes))
    }
}
