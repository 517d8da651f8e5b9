use i2cserial_bridge::{BridgeError, Message};
use serde::Serialize;
use tracing::debug;

use crate::cmd::ScanArgs;
use crate::exit::{bridge_error, CliError, CliResult, SUCCESS};
use crate::output::{address, print_json, print_pretty, print_raw, print_table, OutputFormat};

#[derive(Serialize)]
struct ScanOutput {
    first: u8,
    last: u8,
    found: Vec<u8>,
}

pub fn run(args: ScanArgs, format: OutputFormat) -> CliResult<i32> {
    if args.first > args.last {
        return Err(CliError::usage(format!(
            "--first {} is above --last {}",
            address(args.first),
            address(args.last)
        )));
    }

    let conn = args.link.connect()?;
    let mut found = Vec::new();
    for candidate in args.first..=args.last {
        let mut buf = [0u8; 1];
        match conn.transfer(&mut [Message::read(candidate, &mut buf)]) {
            Ok(_) => found.push(candidate),
            Err(err @ BridgeError::Transport(_)) => return Err(bridge_error("scan failed", err)),
            Err(err) => debug!(address = candidate, error = %err, "no answer"),
        }
    }

    let out = ScanOutput {
        first: args.first,
        last: args.last,
        found,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let rows = out
                .found
                .iter()
                .map(|&found| ("present", address(found)))
                .collect::<Vec<_>>();
            print_table(["STATUS", "ADDRESS"], &rows);
        }
        OutputFormat::Pretty => {
            let listed = out
                .found
                .iter()
                .map(|&found| address(found))
                .collect::<Vec<_>>()
                .join(" ");
            print_pretty(&[
                (
                    "range",
                    format!("{}..={}", address(out.first), address(out.last)),
                ),
                ("found", listed),
            ]);
        }
        OutputFormat::Raw => print_raw(&out.found),
    }

    Ok(SUCCESS)
}
