use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by the configured
/// level when the variable is unset.
///
/// Returns false if a global subscriber was already installed.
pub fn init_logging(settings: &LogSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
