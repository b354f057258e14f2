use tracing_subscriber::EnvFilter;

/// JSON lines on stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
