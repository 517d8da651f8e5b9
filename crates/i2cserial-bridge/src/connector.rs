use i2cserial_transport::SerialTransport;
use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::connection::Connection;
use crate::error::Result;

/// Attach to a bridge over `transport` with default configuration.
pub fn connect<T: SerialTransport>(transport: T) -> Result<Connection<T>> {
    connect_with_config(transport, BridgeConfig::default())
}

/// Attach to a bridge with explicit configuration.
///
/// The bridge must answer a version request within `config.timeout`;
/// otherwise the transport is detached and dropped and
/// [`BridgeError::NoDevice`](crate::BridgeError::NoDevice) is returned.
pub fn connect_with_config<T: SerialTransport>(
    transport: T,
    config: BridgeConfig,
) -> Result<Connection<T>> {
    let name = transport.transport_name();
    let mut connection = Connection::attach(transport, config)?;

    match connection.request_version() {
        Ok(version) => {
            info!(transport = name, %version, "bridge connected");
            connection.firmware = version;
            Ok(connection)
        }
        Err(err) => {
            warn!(transport = name, error = %err, "bridge handshake failed");
            drop(connection.disconnect());
            Err(err)
        }
    }
}
