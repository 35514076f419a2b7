use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging on stderr so the report on stdout stays clean.
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("country_cleaner={}", default_level)));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // Ignore the error if a subscriber is already installed (tests, embedding)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
