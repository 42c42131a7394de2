// src/utils/logging.rs
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "lodscape=info";

// Install a fmt subscriber. `RUST_LOG` takes precedence over `default_filter`.
// Returns false if a global subscriber was already set (e.g. by the host application).
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
