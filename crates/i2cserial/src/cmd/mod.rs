use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use i2cserial_bridge::{connect_with_config, BridgeConfig, Connection, SmbusSize};
use i2cserial_transport::{SerialConfig, SerialLine};
use tracing::debug;

use crate::exit::{bridge_error, transport_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod get;
pub mod probe;
pub mod read;
pub mod scan;
pub mod set;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show version information.
    Version(VersionArgs),
    /// Connect to a bridge and print its firmware version.
    Probe(ProbeArgs),
    /// Read bytes from a device, optionally from a register.
    Read(ReadArgs),
    /// Write bytes to a device.
    Write(WriteArgs),
    /// Read a register with an SMBus transaction.
    Get(GetArgs),
    /// Write a register with an SMBus transaction.
    Set(SetArgs),
    /// List addresses that acknowledge a one-byte read.
    Scan(ScanArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Version(args) => version::run(args),
        Command::Probe(args) => probe::run(args, format),
        Command::Read(args) => read::run(args, format),
        Command::Write(args) => write::run(args, format),
        Command::Get(args) => get::run(args, format),
        Command::Set(args) => set::run(args, format),
        Command::Scan(args) => scan::run(args, format),
    }
}

/// Serial line and bridge settings shared by every device command.
#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    /// Serial device the bridge is attached to.
    #[arg(env = "I2CSERIAL_DEVICE")]
    pub device: PathBuf,
    /// Line speed.
    #[arg(long, env = "I2CSERIAL_BAUD", default_value_t = 115_200)]
    pub baud: u32,
    /// How long to wait for each bridge reply (e.g. 52ms, 1s).
    #[arg(long, env = "I2CSERIAL_TIMEOUT", default_value = "52ms")]
    pub timeout: String,
}

impl LinkArgs {
    pub fn bridge_config(&self) -> CliResult<BridgeConfig> {
        let timeout = parse_duration(&self.timeout)?;
        Ok(BridgeConfig {
            timeout,
            recovery_timeout: timeout,
            ..BridgeConfig::default()
        })
    }

    /// Open the serial line and complete the bridge handshake.
    pub fn connect(&self) -> CliResult<Connection<SerialLine>> {
        let config = self.bridge_config()?;
        let serial = SerialConfig {
            baud_rate: self.baud,
            ..SerialConfig::default()
        };
        debug!(device = ?self.device, baud = self.baud, ?config.timeout, "connecting");

        let line = SerialLine::open(&self.device, &serial)
            .map_err(|err| transport_error("open failed", err))?;
        connect_with_config(line, config).map_err(|err| bridge_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub link: LinkArgs,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// 7-bit device address (e.g. 0x50).
    #[arg(value_parser = parse_address)]
    pub address: u8,
    /// Number of bytes to read.
    #[arg(value_parser = clap::value_parser!(u8).range(1..))]
    pub length: u8,
    /// Register to select with a repeated start before reading.
    #[arg(long, value_parser = parse_byte)]
    pub register: Option<u8>,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// 7-bit device address (e.g. 0x50).
    #[arg(value_parser = parse_address)]
    pub address: u8,
    /// Bytes to write (e.g. 0x10 0xff 7).
    #[arg(required = true, num_args = 1.., value_parser = parse_byte)]
    pub data: Vec<u8>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SizeArg {
    Byte,
    ByteData,
    WordData,
    BlockData,
}

impl From<SizeArg> for SmbusSize {
    fn from(size: SizeArg) -> Self {
        match size {
            SizeArg::Byte => SmbusSize::Byte,
            SizeArg::ByteData => SmbusSize::ByteData,
            SizeArg::WordData => SmbusSize::WordData,
            SizeArg::BlockData => SmbusSize::BlockData,
        }
    }
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// 7-bit device address.
    #[arg(value_parser = parse_address)]
    pub address: u8,
    /// SMBus command (register) byte.
    #[arg(value_parser = parse_byte)]
    pub command: u8,
    /// Transaction shape.
    #[arg(long, value_enum, default_value = "byte-data")]
    pub size: SizeArg,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// 7-bit device address.
    #[arg(value_parser = parse_address)]
    pub address: u8,
    /// SMBus command (register) byte.
    #[arg(value_parser = parse_byte)]
    pub command: u8,
    /// Value(s) to write: none for byte, one byte for byte-data, one 16-bit
    /// word for word-data, 1..=32 bytes for block-data.
    #[arg(value_parser = parse_number)]
    pub values: Vec<u16>,
    /// Transaction shape.
    #[arg(long, value_enum, default_value = "byte-data")]
    pub size: SizeArg,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// First address to probe.
    #[arg(long, default_value = "0x03", value_parser = parse_address)]
    pub first: u8,
    /// Last address to probe.
    #[arg(long, default_value = "0x77", value_parser = parse_address)]
    pub last: u8,
}

/// Parse a decimal or `0x`-prefixed hex number up to 0xffff.
pub fn parse_number(input: &str) -> Result<u16, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid number: {input}"))
}

pub fn parse_byte(input: &str) -> Result<u8, String> {
    let value = parse_number(input)?;
    u8::try_from(value).map_err(|_| format!("{input} does not fit in a byte"))
}

pub fn parse_address(input: &str) -> Result<u8, String> {
    let value = parse_byte(input)?;
    if value > 0x7F {
        return Err(format!("{input} is not a 7-bit address"));
    }
    Ok(value)
}

/// Parse `150ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("timeout must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid timeout value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
