use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Extra filter directives, e.g. `i2cserial_bridge::state=trace` to follow
/// the reply stream byte by byte without the rest of the trace output.
pub const LOG_ENV: &str = "I2CSERIAL_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// `--log-level` sets the default; directives from [`LOG_ENV`] refine it per
/// module.
fn filter_directives(level: LogLevel, extra: Option<&str>) -> String {
    match extra.map(str::trim).filter(|extra| !extra.is_empty()) {
        Some(extra) => format!("{},{extra}", level.directive()),
        None => level.directive().to_string(),
    }
}

/// Install the stderr subscriber. Thread names are kept so lines from the
/// serial reader thread stand out from the caller's. Targets are shown once
/// per-module directives are in play.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let extra = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(filter_directives(level, extra.as_deref())))
        .with_ansi(false)
        .with_target(extra.is_some())
        .with_thread_names(true);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
