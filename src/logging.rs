use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log format (`json` or plain text).
pub const LOG_FORMAT_ENV: &str = "RGSCAN_LOG_FORMAT";

/// Install the global subscriber. Filtering follows `RUST_LOG`, defaulting
/// to `info`. Calling this twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed by a test harness.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
