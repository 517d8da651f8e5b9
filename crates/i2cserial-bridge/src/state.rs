//! Reply-stream state machine.
//!
//! [`Link`] consumes the bytes coming back from the bridge one at a time and
//! keeps track of where the in-flight transaction stands. It is a plain value:
//! no locking, no I/O, no allocation after construction. [`Connection`]
//! wraps it in a mutex and wakes waiting callers when [`Link::intake`]
//! returns [`Intake::Wake`].
//!
//! ```text
//!             ESC                  code, pending > 0
//! WaitingForAck ──► InCommand ─────────────────────────► Reading
//!                    ▲  │  │ 'v'                      ESC │ │ data
//!                    │  │  └──► ReadingVersion            │ ▼
//!                    └──┼─────────────────────────────────┘ buffer
//!                       │ pending == 0 (and read satisfied)
//!                       ▼
//!              WaitingForWatchdog ──'z'──► Idle
//! ```
//!
//! [`Connection`]: crate::Connection

use std::time::Instant;

use i2cserial_frame::wire::REPLY_RESET;
use i2cserial_frame::{Reply, ReplyError, ESCAPE, VERSION_LEN};
use tracing::{debug, trace};

/// Protocol state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No transaction; the bridge has confirmed it is quiescent.
    Idle,
    /// Claimed by a transaction that has not armed the receiver yet.
    Sending,
    /// Bridge is processing; the next meaningful byte is an escape.
    WaitingForAck,
    /// Collecting raw reply bytes until the next escape.
    Reading,
    /// The previous byte was an escape; this one is a reply code.
    InCommand,
    /// Transaction resolved; waiting for the bridge's own reset marker.
    WaitingForWatchdog,
    /// Collecting the fixed-length firmware version.
    ReadingVersion,
}

/// How many raw data bytes the in-flight transaction expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadExpectation {
    /// No read data; acknowledgements alone complete the transaction.
    None,
    /// Exactly this many bytes.
    Exact(usize),
    /// First byte is a count of the bytes that follow, at most `max`.
    LengthPrefixed { max: usize },
}

/// Error recorded against the in-flight transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The bridge reported an error code.
    Reply(ReplyError),
    /// The bridge reset before finishing.
    DeviceReset,
    /// More reply bytes than the receive buffer holds.
    BufferOverflow,
}

/// Outcome of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intake {
    /// Nothing a waiter cares about changed.
    Continue,
    /// The link reached `WaitingForWatchdog` or `Idle`.
    Wake,
}

/// Per-connection protocol state.
#[derive(Debug)]
pub struct Link {
    state: State,
    fault: Option<Fault>,
    buffer: Box<[u8]>,
    position: usize,
    pending: usize,
    expect: ReadExpectation,
    deadline: Option<Instant>,
}

impl Link {
    /// Create an idle link with a receive buffer of `capacity` bytes
    /// (at least the size of a version reply).
    pub fn new(capacity: usize) -> Self {
        Self {
            state: State::Idle,
            fault: None,
            buffer: vec![0u8; capacity.max(VERSION_LEN)].into_boxed_slice(),
            position: 0,
            pending: 0,
            expect: ReadExpectation::None,
            deadline: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Acknowledgements still outstanding.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes received so far for the current transaction.
    pub fn received(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// When the current transaction is considered stalled.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the in-flight transaction has resolved.
    pub fn is_settled(&self) -> bool {
        matches!(self.state, State::WaitingForWatchdog | State::Idle)
    }

    /// Take the link for a new transaction.
    pub fn claim(&mut self) {
        self.state = State::Sending;
    }

    /// Prepare to receive the replies of a transaction.
    ///
    /// `state` is `Reading` for plain reads and `WaitingForAck` for anything
    /// that starts with a write or a control command.
    pub fn arm(&mut self, state: State, replies: usize, expect: ReadExpectation, deadline: Instant) {
        self.state = state;
        self.fault = None;
        self.position = 0;
        self.pending = replies;
        self.expect = expect;
        self.deadline = Some(deadline);
    }

    /// Expect the bridge's reset marker next.
    pub fn await_watchdog(&mut self) {
        self.state = State::WaitingForWatchdog;
        self.pending = 0;
    }

    /// Drop whatever the link was doing.
    pub fn force_idle(&mut self) {
        self.state = State::Idle;
        self.pending = 0;
        self.expect = ReadExpectation::None;
        self.deadline = None;
    }

    /// Feed one byte received from the bridge.
    pub fn intake(&mut self, byte: u8) -> Intake {
        trace!(byte, state = ?self.state, "intake");
        match self.state {
            State::WaitingForAck => {
                if byte == ESCAPE {
                    self.fault = None;
                    self.state = State::InCommand;
                } else {
                    trace!(byte, "ignoring noise while waiting for ack");
                }
                Intake::Continue
            }
            State::InCommand => self.command(byte),
            State::Reading => {
                if byte == ESCAPE {
                    self.state = State::InCommand;
                    Intake::Continue
                } else {
                    self.store(byte);
                    self.settle_if_complete()
                }
            }
            State::ReadingVersion => {
                self.store(byte);
                self.pending = self.pending.saturating_sub(1);
                if self.pending == 0 {
                    self.settle()
                } else {
                    Intake::Continue
                }
            }
            State::WaitingForWatchdog => {
                match byte {
                    ESCAPE => {}
                    REPLY_RESET => {
                        debug!("bridge idle");
                        self.force_idle();
                        return Intake::Wake;
                    }
                    other => trace!(byte = other, "ignoring byte while waiting for watchdog"),
                }
                Intake::Continue
            }
            State::Idle | State::Sending => {
                debug!(byte, state = ?self.state, "unexpected byte from bridge");
                Intake::Continue
            }
        }
    }

    fn command(&mut self, byte: u8) -> Intake {
        match Reply::classify(byte) {
            Reply::Escape => {
                // Doubled escape: literal data. Only a read returns to raw
                // collection; otherwise the next byte is still a reply code.
                self.store(ESCAPE);
                if self.expect == ReadExpectation::None {
                    return Intake::Continue;
                }
                self.state = State::Reading;
                return self.settle_if_complete();
            }
            Reply::Nak(code) => {
                debug!(?code, "bridge reported error");
                self.fault = Some(Fault::Reply(code));
                self.pending = self.pending.saturating_sub(1);
            }
            Reply::Reset => {
                debug!("bridge reset mid-transaction");
                self.fault = Some(Fault::DeviceReset);
                self.pending = 0;
            }
            Reply::Version => {
                self.pending = VERSION_LEN;
                self.position = 0;
                self.state = State::ReadingVersion;
                return Intake::Continue;
            }
            Reply::Wakeup => debug!("bridge wakeup"),
            Reply::WriteAck(code) | Reply::ReadAck(code) => {
                trace!(code, "sub-command acknowledged");
                self.pending = self.pending.saturating_sub(1);
            }
            Reply::Unknown(code) => debug!(code, "unexpected reply code"),
        }

        if self.pending == 0 && (self.fault.is_some() || self.read_satisfied()) {
            self.settle()
        } else {
            self.state = State::Reading;
            Intake::Continue
        }
    }

    fn store(&mut self, byte: u8) {
        match self.buffer.get_mut(self.position) {
            Some(slot) => {
                *slot = byte;
                self.position += 1;
            }
            None => {
                if self.fault.is_none() {
                    debug!(capacity = self.buffer.len(), "receive buffer overflow");
                    self.fault = Some(Fault::BufferOverflow);
                }
            }
        }
    }

    fn read_satisfied(&self) -> bool {
        match self.expect {
            ReadExpectation::None => true,
            ReadExpectation::Exact(len) => self.position >= len,
            ReadExpectation::LengthPrefixed { max } => match self.received().first() {
                Some(&count) => self.position > usize::from(count).min(max),
                None => false,
            },
        }
    }

    fn settle_if_complete(&mut self) -> Intake {
        // An overflowed read can never collect its bytes.
        if self.pending == 0 && (self.fault.is_some() || self.read_satisfied()) {
            self.settle()
        } else {
            Intake::Continue
        }
    }

    fn settle(&mut self) -> Intake {
        self.state = State::WaitingForWatchdog;
        Intake::Wake
    }
}
