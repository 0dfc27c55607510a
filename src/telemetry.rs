use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global fmt subscriber. `RUST_LOG` wins over the configured level.
/// Returns false if a subscriber was already installed by the host.
pub fn init(config: &Config) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .try_init()
        .is_ok()
}
