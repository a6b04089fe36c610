use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when neither the flag, `RUST_LOG`, nor the config file sets one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Installs the global tracing subscriber writing to stderr.
///
/// `RUST_LOG` wins over `level` so individual modules can be turned up.
pub fn init(level: Option<&str>) {
    let level = level.unwrap_or(DEFAULT_LOG_LEVEL);
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}
