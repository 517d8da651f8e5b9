use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use i2cserial_frame::wire::{command_name, READ_LENGTH_PREFIXED};
use i2cserial_frame::{FrameBuilder, MAX_READ_LEN, SMBUS_BLOCK_MAX};
use i2cserial_transport::{ByteSink, SerialTransport};
use tracing::{debug, trace, warn};

use crate::adapter::{Functionality, I2cAdapter};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::message::{Direction, Message, Payload, SmbusData, SmbusSize};
use crate::recovery::FirmwareVersion;
use crate::state::{Intake, Link, ReadExpectation, State};

/// SMBus shapes the bridge firmware can express.
const SUPPORTED_SMBUS: [SmbusSize; 4] = [
    SmbusSize::Byte,
    SmbusSize::ByteData,
    SmbusSize::WordData,
    SmbusSize::BlockData,
];

/// Link state shared between callers and the transport's receive context.
pub(crate) struct Shared {
    link: Mutex<Link>,
    changed: Condvar,
}

impl Shared {
    fn new(capacity: usize) -> Self {
        Self {
            link: Mutex::new(Link::new(capacity)),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until `done` holds or `deadline` passes. The flag reports which.
    pub(crate) fn wait_until(
        &self,
        deadline: Instant,
        mut done: impl FnMut(&Link) -> bool,
    ) -> (MutexGuard<'_, Link>, bool) {
        let mut link = self.lock();
        loop {
            if done(&link) {
                return (link, true);
            }
            let now = Instant::now();
            if now >= deadline {
                return (link, false);
            }
            link = self
                .changed
                .wait_timeout(link, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Block until the armed transaction settles or the deadline it was
    /// armed with passes. The flag reports which.
    pub(crate) fn wait_settled(&self) -> (MutexGuard<'_, Link>, bool) {
        let mut link = self.lock();
        loop {
            if link.is_settled() {
                return (link, true);
            }
            let now = Instant::now();
            let remaining = match link.deadline() {
                Some(deadline) if deadline > now => deadline - now,
                _ => return (link, false),
            };
            link = self
                .changed
                .wait_timeout(link, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

impl ByteSink for Shared {
    fn on_byte_received(&self, byte: u8) {
        let wake = self.lock().intake(byte);
        if wake == Intake::Wake {
            self.changed.notify_all();
        }
    }
}

/// How the link is armed for one exchange.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Plan {
    start: State,
    replies: usize,
    expect: ReadExpectation,
    /// The previous message kept the bus, so the bridge will not send its
    /// reset marker in between.
    chained: bool,
}

impl Plan {
    /// A write or control command answered by one acknowledgement.
    pub(crate) fn write() -> Self {
        Self {
            start: State::WaitingForAck,
            replies: 1,
            expect: ReadExpectation::None,
            chained: false,
        }
    }

    fn read(len: usize) -> Self {
        Self {
            start: State::Reading,
            replies: 1,
            expect: ReadExpectation::Exact(len),
            chained: false,
        }
    }

    fn write_then_read(expect: ReadExpectation) -> Self {
        Self {
            start: State::WaitingForAck,
            replies: 2,
            expect,
            chained: false,
        }
    }

    fn chained(mut self, chained: bool) -> Self {
        self.chained = chained;
        self
    }
}

/// An attached bridge.
///
/// Created by [`connect`](crate::connect). Transactions are serialized: a
/// caller arriving while another transaction is in flight blocks until it
/// finishes.
pub struct Connection<T: SerialTransport> {
    transport: T,
    shared: Arc<Shared>,
    txn: Mutex<FrameBuilder>,
    config: BridgeConfig,
    pub(crate) firmware: FirmwareVersion,
}

impl<T: SerialTransport> Connection<T> {
    /// Attach to `transport` without talking to the bridge yet.
    pub(crate) fn attach(mut transport: T, config: BridgeConfig) -> Result<Self> {
        let shared = Arc::new(Shared::new(config.effective_receive_capacity()));
        let sink: Arc<dyn ByteSink> = shared.clone();
        transport.attach(sink)?;
        debug!(
            transport = transport.transport_name(),
            capacity = config.effective_receive_capacity(),
            "link attached"
        );

        Ok(Self {
            transport,
            shared,
            txn: Mutex::new(FrameBuilder::with_config(config.frame.clone())),
            config,
            firmware: FirmwareVersion::default(),
        })
    }

    /// Execute `messages` in order.
    ///
    /// Every message is checked before anything is sent. Returns the total
    /// number of payload bytes transferred.
    pub fn transfer(&self, messages: &mut [Message<'_>]) -> Result<usize> {
        let mut builder = self.lock_txn();

        for message in messages.iter() {
            self.validate(&mut builder, message)?;
        }

        let mut moved = 0;
        let mut chained = false;
        for (index, message) in messages.iter_mut().enumerate() {
            debug!(
                index,
                address = message.address,
                direction = ?message.direction(),
                len = message.len(),
                no_stop = message.no_stop,
                "transfer message"
            );

            encode_message(&mut builder, message);
            let plan = match &message.payload {
                Payload::Read(buf) => Plan::read(buf.len()),
                Payload::Write(_) => Plan::write(),
            };

            let link = self.execute(&mut builder, plan.chained(chained))?;
            if let Payload::Read(buf) = &mut message.payload {
                let data = link
                    .received()
                    .get(..buf.len())
                    .ok_or(BridgeError::BufferOverflow)?;
                buf.copy_from_slice(data);
            }
            moved += message.len();
            chained = message.no_stop;
        }

        Ok(moved)
    }

    /// Execute one SMBus transaction against `address`.
    ///
    /// For reads the result is stored in `data`; for writes `data` supplies
    /// the value. Shapes the bridge cannot express fail with
    /// [`BridgeError::Unsupported`] before anything is sent.
    pub fn smbus_transfer(
        &self,
        address: u8,
        direction: Direction,
        command: u8,
        size: SmbusSize,
        data: &mut SmbusData,
    ) -> Result<()> {
        check_address(address)?;

        let mut builder = self.lock_txn();
        builder.clear();

        let plan = match (size, direction) {
            (SmbusSize::Byte, Direction::Write) => {
                builder.write(address, false).data(&[command]).footer();
                Plan::write()
            }
            (SmbusSize::Byte, Direction::Read) => {
                builder.read(address, 1, false);
                Plan::read(1)
            }
            (SmbusSize::ByteData, Direction::Write) => {
                builder
                    .write(address, false)
                    .data(&[command, data.byte()])
                    .footer();
                Plan::write()
            }
            (SmbusSize::ByteData, Direction::Read) => {
                builder
                    .write(address, false)
                    .data(&[command])
                    .read(address, 1, false);
                Plan::write_then_read(ReadExpectation::Exact(1))
            }
            (SmbusSize::WordData, Direction::Write) => {
                builder
                    .write(address, false)
                    .data(&[command])
                    .data(&data.word().to_le_bytes())
                    .footer();
                Plan::write()
            }
            (SmbusSize::WordData, Direction::Read) => {
                builder
                    .write(address, false)
                    .data(&[command])
                    .read(address, 2, false);
                Plan::write_then_read(ReadExpectation::Exact(2))
            }
            (SmbusSize::BlockData, Direction::Write) => {
                let count = usize::from(data.byte());
                if count == 0 || count > SMBUS_BLOCK_MAX {
                    return Err(BridgeError::InvalidBlock(count));
                }
                builder
                    .write(address, false)
                    .data(&[command])
                    .data(data.counted_block())
                    .footer();
                Plan::write()
            }
            (SmbusSize::BlockData, Direction::Read) => {
                builder
                    .write(address, false)
                    .data(&[command])
                    .read(address, READ_LENGTH_PREFIXED, false);
                Plan::write_then_read(ReadExpectation::LengthPrefixed {
                    max: SMBUS_BLOCK_MAX,
                })
            }
            (
                SmbusSize::Quick
                | SmbusSize::ProcessCall
                | SmbusSize::I2cBlockData
                | SmbusSize::BlockProcessCall,
                _,
            ) => {
                return Err(BridgeError::Unsupported(format!("SMBus {size} transfers")));
            }
        };

        debug!(address, command, %size, ?direction, "smbus transfer");
        let link = self.execute(&mut builder, plan)?;
        if direction == Direction::Write {
            return Ok(());
        }

        let received = link.received();
        match size {
            SmbusSize::WordData => {
                let [lo, hi] = first_bytes::<2>(received)?;
                data.set_word(u16::from_le_bytes([lo, hi]));
            }
            SmbusSize::BlockData => {
                let count = received.first().map_or(0, |&count| usize::from(count));
                if count == 0 || count > SMBUS_BLOCK_MAX {
                    return Err(BridgeError::InvalidBlock(count));
                }
                let block = received
                    .get(1..=count)
                    .ok_or(BridgeError::BufferOverflow)?;
                data.set_block(block)?;
            }
            _ => {
                let [value] = first_bytes::<1>(received)?;
                data.set_byte(value);
            }
        }
        Ok(())
    }

    /// Shapes this connection accepts.
    pub fn functionality(&self) -> Functionality {
        Functionality {
            i2c: true,
            no_stop: true,
            smbus: SUPPORTED_SMBUS.to_vec(),
        }
    }

    /// Current protocol state.
    pub fn state(&self) -> State {
        self.shared.lock().state()
    }

    /// Firmware version reported during the connection handshake.
    pub fn firmware_version(&self) -> FirmwareVersion {
        self.firmware
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Stop receiving and hand the transport back.
    pub fn disconnect(mut self) -> T {
        self.transport.detach();
        debug!(transport = self.transport.transport_name(), "link detached");
        self.transport
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    pub(crate) fn lock_txn(&self) -> MutexGuard<'_, FrameBuilder> {
        self.txn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send the frame in `builder` and wait for the bridge to resolve it.
    ///
    /// On success the settled link is returned locked so the caller can copy
    /// out the reply bytes.
    pub(crate) fn execute(
        &self,
        builder: &mut FrameBuilder,
        plan: Plan,
    ) -> Result<MutexGuard<'_, Link>> {
        let frame = builder.finish()?;

        {
            let idle_by = Instant::now() + self.config.timeout;
            let (mut link, idle) = self.shared.wait_until(idle_by, |link| {
                link.state() == State::Idle
                    || (plan.chained && link.state() == State::WaitingForWatchdog)
            });
            if !idle {
                warn!(state = ?link.state(), "bridge never went idle, forcing");
                link.force_idle();
            }
            link.claim();
            // Arm before sending: replies may arrive before send returns.
            link.arm(
                plan.start,
                plan.replies,
                plan.expect,
                Instant::now() + self.config.timeout,
            );
        }

        trace!(
            command = command_name(frame.get(1).copied().unwrap_or_default()),
            len = frame.len(),
            "sending frame"
        );
        self.transport.send(frame)?;

        let (link, settled) = self.shared.wait_settled();
        if !settled {
            drop(link);
            warn!(timeout = ?self.config.timeout, "no response from bridge, resetting");
            if let Err(err) = self.reset_exchange(builder) {
                warn!(error = %err, "recovery after timeout failed");
            }
            return Err(BridgeError::Timeout(self.config.timeout));
        }

        if let Some(fault) = link.fault() {
            drop(link);
            debug!(?fault, "transaction failed");
            if fault == crate::state::Fault::DeviceReset {
                if let Err(err) = self.reset_exchange(builder) {
                    warn!(error = %err, "recovery after device reset failed");
                }
            }
            return Err(fault.into());
        }

        Ok(link)
    }

    fn validate(&self, builder: &mut FrameBuilder, message: &Message<'_>) -> Result<()> {
        check_address(message.address)?;
        if let Payload::Read(buf) = &message.payload {
            let max = MAX_READ_LEN.min(self.shared.lock().capacity());
            if buf.is_empty() {
                return Err(BridgeError::Unsupported("zero-length read".to_string()));
            }
            if buf.len() > max {
                return Err(BridgeError::MessageTooLarge {
                    size: buf.len(),
                    max,
                });
            }
        }
        encode_message(builder, message);
        builder.finish()?;
        Ok(())
    }
}

impl<T: SerialTransport> I2cAdapter for Connection<T> {
    fn transfer(&self, messages: &mut [Message<'_>]) -> Result<usize> {
        Connection::transfer(self, messages)
    }

    fn smbus_transfer(
        &self,
        address: u8,
        direction: Direction,
        command: u8,
        size: SmbusSize,
        data: &mut SmbusData,
    ) -> Result<()> {
        Connection::smbus_transfer(self, address, direction, command, size, data)
    }

    fn functionality(&self) -> Functionality {
        Connection::functionality(self)
    }
}

impl<T: SerialTransport> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transport", &self.transport.transport_name())
            .field("state", &self.state())
            .field("firmware", &self.firmware)
            .field("config", &self.config)
            .finish()
    }
}

fn check_address(address: u8) -> Result<()> {
    if address > 0x7F {
        return Err(BridgeError::InvalidAddress(address));
    }
    Ok(())
}

/// Replace the contents of `builder` with the frame for `message`.
fn encode_message(builder: &mut FrameBuilder, message: &Message<'_>) {
    builder.clear();
    match &message.payload {
        Payload::Read(buf) => {
            // Lengths are checked against MAX_READ_LEN before encoding.
            builder.read(message.address, buf.len() as u8, message.no_stop);
        }
        Payload::Write(data) => {
            builder.write(message.address, message.no_stop).data(data);
            if !message.no_stop {
                builder.footer();
            }
        }
    }
}

fn first_bytes<const N: usize>(received: &[u8]) -> Result<[u8; N]> {
    received
        .get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(BridgeError::BufferOverflow)
}
