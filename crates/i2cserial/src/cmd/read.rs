use i2cserial_bridge::Message;
use serde::Serialize;

use crate::cmd::ReadArgs;
use crate::exit::{bridge_error, CliResult, SUCCESS};
use crate::output::{address, hex, print_record, OutputFormat};

#[derive(Serialize)]
struct ReadOutput {
    address: u8,
    register: Option<u8>,
    data: Vec<u8>,
    hex: String,
}

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = args.link.connect()?;
    let mut buf = vec![0u8; usize::from(args.length)];

    let result = match args.register {
        Some(register) => conn.transfer(&mut [
            Message::write(args.address, &[register]).no_stop(),
            Message::read(args.address, &mut buf),
        ]),
        None => conn.transfer(&mut [Message::read(args.address, &mut buf)]),
    };
    result.map_err(|err| bridge_error("read failed", err))?;

    let out = ReadOutput {
        address: args.address,
        register: args.register,
        hex: hex(&buf),
        data: buf,
    };
    let mut rows = vec![("address", address(out.address))];
    if let Some(register) = out.register {
        rows.push(("register", format!("{register:#04x}")));
    }
    rows.push(("data", out.hex.clone()));
    print_record(&out, &rows, &out.data, format);

    Ok(SUCCESS)
}
