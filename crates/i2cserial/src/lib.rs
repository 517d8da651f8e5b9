//! I2C/SMBus over a serial-attached bridge microcontroller.
//!
//! The bridge firmware speaks an escaped byte-command protocol over a plain
//! serial line. This crate bundles the layers needed to drive it.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte transport traits and the serial line
//! - [`frame`]: command framing, escape stuffing and reply classification
//! - [`bridge`]: the reply state machine, transactions and recovery

/// Re-export transport types.
pub mod transport {
    pub use i2cserial_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use i2cserial_frame::*;
}

/// Re-export bridge types.
pub mod bridge {
    pub use i2cserial_bridge::*;
}
