pub use tracing::{self, debug, error, info, instrument, trace, warn};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Sets up the logging for any crate
pub fn setup_log() {
    std::panic::set_hook(Box::new(|info| {
        error!(target: "warden", "Panic occurred: {}", info);
        std::process::exit(1);
    }));

    setup_log_no_panic_hook()
}

pub fn setup_log_no_panic_hook() {
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_target(true)
        .with_env_filter(EnvFilter::from_default_env())
        .finish()
        .try_init();
}
