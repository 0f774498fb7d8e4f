use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` when set, otherwise `default_filter`.
/// Example: `RUST_LOG=debug cargo run --bin analytics-service`
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter))
        )
        .init();
}
