use tracing_subscriber::EnvFilter;

/// Filter directive for a verbosity count: 0 silent, 1 info, 2+ debug.
pub fn default_log_filter(verbosity: u8, quiet: bool) -> &'static str {
    match (quiet, verbosity) {
        (true, _) | (false, 0) => "off",
        (false, 1) => "credsweep=info",
        (false, _) => "credsweep=debug",
    }
}

/// Install the process-wide subscriber. `RUST_LOG` wins over the verbosity
/// flags. Returns false when a subscriber was already installed.
pub fn init(verbosity: u8, quiet: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbosity, quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_level(false)
        .without_time()
        .try_init()
        .is_ok()
}
