use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("i2cserial {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: i2cserial");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("I2CSERIAL_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("I2CSERIAL_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "protocol: escape={:#04x} version_len={} max_read={}",
        i2cserial_frame::ESCAPE,
        i2cserial_frame::VERSION_LEN,
        i2cserial_frame::MAX_READ_LEN
    );
    println!(
        "defaults: timeout={:?} receive_capacity={}",
        i2cserial_bridge::DEFAULT_TIMEOUT,
        i2cserial_bridge::DEFAULT_RECEIVE_CAPACITY
    );

    println!("log_env: {}", crate::logging::LOG_ENV);

    Ok(SUCCESS)
}
