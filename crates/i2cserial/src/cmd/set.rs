use i2cserial_bridge::{Direction, SmbusData, SmbusSize};
use serde::Serialize;

use crate::cmd::{SetArgs, SizeArg};
use crate::exit::{bridge_error, CliError, CliResult, SUCCESS};
use crate::output::{address, print_record, OutputFormat};

#[derive(Serialize)]
struct SetOutput {
    address: u8,
    command: u8,
    size: SmbusSize,
    values: Vec<u16>,
}

/// Build the SMBus data for `size` from the command-line values.
pub fn data_for(size: SizeArg, values: &[u16]) -> CliResult<SmbusData> {
    match (size, values) {
        (SizeArg::Byte, []) => Ok(SmbusData::new()),
        (SizeArg::Byte, _) => Err(CliError::usage("byte writes take no value")),
        (SizeArg::ByteData, [value]) => Ok(SmbusData::from_byte(to_byte(*value)?)),
        (SizeArg::WordData, [value]) => Ok(SmbusData::from_word(*value)),
        (SizeArg::BlockData, values) if !values.is_empty() => {
            let block = values
                .iter()
                .map(|&value| to_byte(value))
                .collect::<CliResult<Vec<u8>>>()?;
            SmbusData::from_block(&block).map_err(|err| CliError::usage(err.to_string()))
        }
        (size, _) => Err(CliError::usage(format!(
            "wrong number of values for {}",
            SmbusSize::from(size)
        ))),
    }
}

fn to_byte(value: u16) -> CliResult<u8> {
    u8::try_from(value).map_err(|_| CliError::usage(format!("{value:#x} does not fit in a byte")))
}

pub fn run(args: SetArgs, format: OutputFormat) -> CliResult<i32> {
    let mut data = data_for(args.size, &args.values)?;
    let size = SmbusSize::from(args.size);

    let conn = args.link.connect()?;
    conn.smbus_transfer(args.address, Direction::Write, args.command, size, &mut data)
        .map_err(|err| bridge_error("set failed", err))?;

    let out = SetOutput {
        address: args.address,
        command: args.command,
        size,
        values: args.values,
    };
    let shown = out
        .values
        .iter()
        .map(|value| format!("{value:#04x}"))
        .collect::<Vec<_>>()
        .join(" ");
    let rows = [
        ("address", address(out.address)),
        ("command", format!("{:#04x}", out.command)),
        ("size", size.to_string()),
        ("values", shown),
    ];
    print_record(&out, &rows, &[], format);

    Ok(SUCCESS)
}
