use i2cserial_bridge::{Direction, SmbusData, SmbusSize};
use serde::Serialize;

use crate::cmd::GetArgs;
use crate::exit::{bridge_error, CliResult, SUCCESS};
use crate::output::{address, hex, print_record, OutputFormat};

#[derive(Serialize)]
struct GetOutput {
    address: u8,
    command: u8,
    size: SmbusSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block: Option<Vec<u8>>,
}

pub fn run(args: GetArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = args.link.connect()?;
    let size = SmbusSize::from(args.size);
    let mut data = SmbusData::new();
    conn.smbus_transfer(args.address, Direction::Read, args.command, size, &mut data)
        .map_err(|err| bridge_error("get failed", err))?;

    let (value, block) = match size {
        SmbusSize::WordData => (Some(data.word()), None),
        SmbusSize::BlockData => (None, Some(data.block().to_vec())),
        _ => (Some(u16::from(data.byte())), None),
    };
    let out = GetOutput {
        address: args.address,
        command: args.command,
        size,
        value,
        block,
    };

    let (shown, raw) = match (&out.value, &out.block) {
        (_, Some(block)) => (hex(block), block.clone()),
        (Some(word), None) if size == SmbusSize::WordData => {
            (format!("{word:#06x}"), word.to_le_bytes().to_vec())
        }
        (Some(byte), None) => (format!("{byte:#04x}"), vec![data.byte()]),
        (None, None) => (String::new(), Vec::new()),
    };
    let rows = [
        ("address", address(out.address)),
        ("command", format!("{:#04x}", out.command)),
        ("size", size.to_string()),
        ("value", shown),
    ];
    print_record(&out, &rows, &raw, format);

    Ok(SUCCESS)
}
