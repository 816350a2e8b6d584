use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured JSON logging on stdout.
/// `RUST_LOG` controls the level; the default is `info`.
pub fn init_telemetry() {
    init_with_default_filter("info");
}

/// Same as `init_telemetry` but with a caller-chosen fallback filter.
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_with_default_filter(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_initialization_is_harmless() {
        init_with_default_filter("debug");
        init_with_default_filter("info");
        tracing::debug!("telemetry initialized twice without panicking");
    }
}
