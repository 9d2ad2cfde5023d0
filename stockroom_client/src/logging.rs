//! Structured logging configuration.
//!
//! Log records from the `stockroom` library (which uses the `log` facade)
//! are bridged into the same subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

/// Initialize logging to stderr, keeping stdout for the console.
///
/// Configurable log levels via the RUST_LOG env var.
///
/// # Example
///
/// ```no_run
/// use stockroom_client::logging;
///
/// logging::init();
/// tracing::info!("Client starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Logging initialized");
}

/// Log an authentication event with structured data
///
/// # Arguments
///
/// * `event_type` - Type of event, e.g. `failed_login` or `forced_logout`
/// * `user_id` - User involved, when known
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use stockroom_client::logging::log_auth_event;
///
/// log_auth_event("failed_login", None, "Invalid credentials");
/// ```
pub fn log_auth_event(event_type: &str, user_id: Option<i64>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        "AUTH: {}",
        message
    );
}
