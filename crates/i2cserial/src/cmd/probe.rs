use serde::Serialize;

use i2cserial_bridge::{FirmwareVersion, Functionality};
use i2cserial_transport::SerialTransport;

use crate::cmd::ProbeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

#[derive(Serialize)]
struct ProbeOutput {
    device: String,
    transport: &'static str,
    firmware: String,
    firmware_bytes: FirmwareVersion,
    functionality: Functionality,
}

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = args.link.connect()?;
    let firmware = conn.firmware_version();

    let out = ProbeOutput {
        device: args.link.device.display().to_string(),
        transport: conn.transport().transport_name(),
        firmware: firmware.to_string(),
        firmware_bytes: firmware,
        functionality: conn.functionality(),
    };

    let smbus = out
        .functionality
        .smbus
        .iter()
        .map(|size| size.name())
        .collect::<Vec<_>>()
        .join(", ");
    let rows = [
        ("device", out.device.clone()),
        ("transport", out.transport.to_string()),
        ("firmware", out.firmware.clone()),
        ("smbus", smbus),
    ];
    print_record(&out, &rows, &firmware.0, format);

    conn.disconnect();
    Ok(SUCCESS)
}
