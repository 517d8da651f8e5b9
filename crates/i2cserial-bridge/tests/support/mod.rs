#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use i2cserial_bridge::{connect_with_config, BridgeConfig, Connection};
use i2cserial_transport::{ByteSink, SerialTransport, TransportError};

pub const ESC: u8 = 0x1B;
pub const EOT: u8 = 0x04;
pub const VERSION: [u8; 4] = [1, 2, 3, 4];

/// Reply sent by a healthy bridge once it has finished a transaction.
pub const WATCHDOG: [u8; 2] = [ESC, b'z'];

struct Step {
    trigger: Vec<u8>,
    reply: Vec<u8>,
    delay: Option<Duration>,
}

#[derive(Default)]
struct Inner {
    sent: Mutex<Vec<u8>>,
    mark: Mutex<usize>,
    script: Mutex<VecDeque<Step>>,
    sink: Mutex<Option<Arc<dyn ByteSink>>>,
    fail_sends: AtomicBool,
    attaches: Mutex<usize>,
}

/// Scripted stand-in for the bridge microcontroller.
///
/// Steps are matched in order: once the bytes sent since the previous match
/// end with a step's trigger, its reply is delivered to the attached sink.
/// Unscripted frames get no answer.
#[derive(Clone, Default)]
pub struct FakeBridge {
    inner: Arc<Inner>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bridge that answers the connection handshake.
    pub fn with_version() -> Self {
        let bridge = Self::new();
        let mut reply = vec![ESC, b'v'];
        reply.extend_from_slice(&VERSION);
        reply.extend_from_slice(&WATCHDOG);
        bridge.expect(&[ESC, b'v'], &reply);
        bridge
    }

    /// Answer the next occurrence of `trigger` with `reply`.
    pub fn expect(&self, trigger: &[u8], reply: &[u8]) -> &Self {
        self.push(trigger, reply, None)
    }

    /// Like [`expect`](Self::expect), but the reply arrives from another
    /// thread after `delay`.
    pub fn expect_delayed(&self, trigger: &[u8], reply: &[u8], delay: Duration) -> &Self {
        self.push(trigger, reply, Some(delay))
    }

    /// Answer the next reset request the way the firmware does.
    pub fn expect_reset(&self) -> &Self {
        self.expect(&[ESC, b'z'], &WATCHDOG)
    }

    /// Deliver bytes as if the bridge sent them unprompted.
    pub fn inject(&self, bytes: &[u8]) {
        deliver(&self.inner, bytes);
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<u8> {
        self.inner.sent.lock().unwrap().clone()
    }

    pub fn clear_sent(&self) {
        self.inner.sent.lock().unwrap().clear();
        *self.inner.mark.lock().unwrap() = 0;
    }

    pub fn fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn is_attached(&self) -> bool {
        self.inner.sink.lock().unwrap().is_some()
    }

    pub fn attach_count(&self) -> usize {
        *self.inner.attaches.lock().unwrap()
    }

    /// Scripted steps not yet triggered.
    pub fn remaining(&self) -> usize {
        self.inner.script.lock().unwrap().len()
    }

    fn push(&self, trigger: &[u8], reply: &[u8], delay: Option<Duration>) -> &Self {
        self.inner.script.lock().unwrap().push_back(Step {
            trigger: trigger.to_vec(),
            reply: reply.to_vec(),
            delay,
        });
        self
    }
}

fn deliver(inner: &Inner, bytes: &[u8]) {
    let sink = inner.sink.lock().unwrap().clone();
    if let Some(sink) = sink {
        for &byte in bytes {
            sink.on_byte_received(byte);
        }
    }
}

impl SerialTransport for FakeBridge {
    fn send_byte(&self, byte: u8) -> Result<(), TransportError> {
        if self.inner.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }

        let step = {
            let mut sent = self.inner.sent.lock().unwrap();
            sent.push(byte);
            let mut mark = self.inner.mark.lock().unwrap();
            let mut script = self.inner.script.lock().unwrap();
            let hit = script
                .front()
                .is_some_and(|step| sent[*mark..].ends_with(&step.trigger));
            if hit {
                *mark = sent.len();
                script.pop_front()
            } else {
                None
            }
        };

        if let Some(step) = step {
            match step.delay {
                None => deliver(&self.inner, &step.reply),
                Some(delay) => {
                    let inner = Arc::clone(&self.inner);
                    thread::spawn(move || {
                        thread::sleep(delay);
                        deliver(&inner, &step.reply);
                    });
                }
            }
        }
        Ok(())
    }

    fn attach(&mut self, sink: Arc<dyn ByteSink>) -> Result<(), TransportError> {
        let mut slot = self.inner.sink.lock().unwrap();
        if slot.is_some() {
            return Err(TransportError::AlreadyAttached);
        }
        *slot = Some(sink);
        *self.inner.attaches.lock().unwrap() += 1;
        Ok(())
    }

    fn detach(&mut self) {
        self.inner.sink.lock().unwrap().take();
    }

    fn transport_name(&self) -> &'static str {
        "fake"
    }
}

/// Short timeouts so failure paths finish quickly.
pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        timeout: Duration::from_millis(50),
        recovery_timeout: Duration::from_millis(50),
        ..BridgeConfig::default()
    }
}

/// Connect to a bridge that answers the handshake, then forget the
/// handshake bytes.
pub fn connected(bridge: &FakeBridge) -> Connection<FakeBridge> {
    connected_with(bridge, test_config())
}

pub fn connected_with(bridge: &FakeBridge, config: BridgeConfig) -> Connection<FakeBridge> {
    let conn = connect_with_config(bridge.clone(), config).unwrap();
    bridge.clear_sent();
    conn
}

/// `ESC 'S' addr data.. ESC EOT`, with data escape-stuffed.
pub fn write_frame(address: u8, data: &[u8]) -> Vec<u8> {
    let mut frame = vec![ESC, b'S', address];
    for &byte in data {
        frame.push(byte);
        if byte == ESC {
            frame.push(ESC);
        }
    }
    frame.extend_from_slice(&[ESC, EOT]);
    frame
}

/// Concatenate reply pieces.
pub fn reply(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}
