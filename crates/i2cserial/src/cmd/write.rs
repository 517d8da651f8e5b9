use i2cserial_bridge::Message;
use serde::Serialize;

use crate::cmd::WriteArgs;
use crate::exit::{bridge_error, CliResult, SUCCESS};
use crate::output::{address, print_record, OutputFormat};

#[derive(Serialize)]
struct WriteOutput {
    address: u8,
    written: usize,
}

pub fn run(args: WriteArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = args.link.connect()?;
    let written = conn
        .transfer(&mut [Message::write(args.address, &args.data)])
        .map_err(|err| bridge_error("write failed", err))?;

    let out = WriteOutput {
        address: args.address,
        written,
    };
    let rows = [
        ("address", address(out.address)),
        ("written", out.written.to_string()),
    ];
    print_record(&out, &rows, written.to_string().as_bytes(), format);

    Ok(SUCCESS)
}
