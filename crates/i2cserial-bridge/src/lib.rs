//! I2C/SMBus transactions over a serial-attached bridge microcontroller.
//!
//! A [`Connection`] turns bus-level requests into escaped command frames,
//! sends them over a [`SerialTransport`](i2cserial_transport::SerialTransport)
//! and resolves them from the bridge's byte-at-a-time replies.
//!
//! ```no_run
//! use i2cserial_bridge::{connect, Message};
//! use i2cserial_transport::{SerialConfig, SerialLine};
//!
//! let line = SerialLine::open("/dev/ttyACM0", &SerialConfig::default())?;
//! let bridge = connect(line)?;
//! println!("firmware {}", bridge.firmware_version());
//!
//! let mut value = [0u8; 2];
//! bridge.transfer(&mut [
//!     Message::write(0x50, &[0x10]).no_stop(),
//!     Message::read(0x50, &mut value),
//! ])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
pub mod message;
pub mod recovery;
pub mod state;

pub use adapter::{Functionality, I2cAdapter};
pub use config::{BridgeConfig, DEFAULT_RECEIVE_CAPACITY, DEFAULT_TIMEOUT};
pub use connection::Connection;
pub use connector::{connect, connect_with_config};
pub use error::{BridgeError, Result};
pub use message::{Direction, Message, Payload, SmbusData, SmbusSize, SMBUS_DATA_LEN};
pub use recovery::FirmwareVersion;
pub use state::{Fault, Intake, Link, ReadExpectation, State};
