use taskrank_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. RUST_LOG wins over `logging.filter`.
pub fn init(logging: &LoggingConfig) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(&logging.filter).unwrap_or_else(|err| {
            eprintln!("warning: invalid logging.filter '{}': {err}", logging.filter);
            EnvFilter::new("warn")
        }),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
