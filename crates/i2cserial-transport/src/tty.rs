use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, SerialTransport};

const READ_CHUNK_SIZE: usize = 64;

/// Line settings for [`SerialLine`].
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Line speed. Default: 115200.
    pub baud_rate: u32,
    /// How long a blocking read may wait before the reader re-checks for
    /// shutdown. Also bounds how long a write may block.
    pub read_poll: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_poll: Duration::from_millis(100),
        }
    }
}

/// Raw serial line to the bridge.
///
/// Opens the device 8N1 without flow control, so every byte travels
/// untouched. Received bytes are forwarded by a dedicated reader thread to
/// the attached [`ByteSink`].
pub struct SerialLine {
    path: PathBuf,
    port: Mutex<Box<dyn SerialPort>>,
    reader: Option<Reader>,
}

struct Reader {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl SerialLine {
    /// Open `path` and configure it according to `config`.
    ///
    /// Baud rates the platform cannot drive are reported by the open itself.
    pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let port = serialport::new(path.to_string_lossy(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_poll)
            .open()
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;

        // Stale bytes from before we owned the line would desynchronize the
        // first reply.
        port.clear(ClearBuffer::All).map_err(|e| TransportError::Configure {
            path: path.clone(),
            source: e,
        })?;

        info!(?path, baud = config.baud_rate, "opened serial line");

        Ok(Self {
            path,
            port: Mutex::new(port),
            reader: None,
        })
    }

    /// The device path this line was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn port(&self) -> MutexGuard<'_, Box<dyn SerialPort>> {
        self.port.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SerialTransport for SerialLine {
    fn send_byte(&self, byte: u8) -> Result<()> {
        self.send(&[byte])
    }

    fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut port = self.port();
        match port.write_all(bytes).and_then(|()| port.flush()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::WriteZero => Err(TransportError::Shutdown),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn attach(&mut self, sink: Arc<dyn ByteSink>) -> Result<()> {
        if self.reader.is_some() {
            return Err(TransportError::AlreadyAttached);
        }

        let mut port = self.port().try_clone()?;
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("i2cserial-rx".to_string())
                .spawn(move || {
                    let mut chunk = [0u8; READ_CHUNK_SIZE];
                    while !stop.load(Ordering::Acquire) {
                        let read = match port.read(&mut chunk) {
                            Ok(0) => continue,
                            Ok(n) => n,
                            // Poll interval elapsed with nothing on the line.
                            Err(err) if err.kind() == ErrorKind::TimedOut => continue,
                            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                            Err(err) => {
                                warn!(error = %err, "serial reader stopped");
                                break;
                            }
                        };
                        trace!(bytes = read, "serial bytes received");
                        for &byte in &chunk[..read] {
                            sink.on_byte_received(byte);
                        }
                    }
                })?
        };

        debug!(path = ?self.path, "serial reader attached");
        self.reader = Some(Reader { stop, thread });
        Ok(())
    }

    fn detach(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.stop.store(true, Ordering::Release);
            if reader.thread.join().is_err() {
                warn!(path = ?self.path, "serial reader panicked");
            }
            debug!(path = ?self.path, "serial reader detached");
        }
    }

    fn transport_name(&self) -> &'static str {
        "tty"
    }
}

impl Drop for SerialLine {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for SerialLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLine")
            .field("path", &self.path)
            .field("attached", &self.reader.is_some())
            .finish()
    }
}
