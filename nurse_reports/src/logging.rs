//! Structured logging setup and event helpers.
//!
//! The library itself only emits `tracing` events; hosts call [`init`] once
//! at startup to install a subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var. Calling this more
/// than once is harmless; later calls are ignored.
///
/// # Example
///
/// ```no_run
/// use nurse_reports::logging;
///
/// logging::init();
/// tracing::info!("Starting up");
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!("Structured logging initialized");
    }
}

/// Log security event with structured data
///
/// Tokens must never be passed in `message`.
///
/// # Example
///
/// ```
/// use nurse_reports::logging::log_security_event;
///
/// log_security_event("claims_invalid", None, "Access token failed signature check");
/// ```
pub fn log_security_event(event_type: &str, user_id: Option<&str>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        "SECURITY: {}",
        message
    );
}

/// Log an outbound request to one of the hosted services
pub fn log_remote_call(service: &str, operation: &str, duration_ms: u64, ok: bool) {
    if !ok {
        tracing::warn!(
            service = service,
            operation = operation,
            duration_ms = duration_ms,
            "Remote call failed"
        );
    } else if duration_ms > 1000 {
        tracing::warn!(
            service = service,
            operation = operation,
            duration_ms = duration_ms,
            "Slow remote call"
        );
    } else {
        tracing::debug!(
            service = service,
            operation = operation,
            duration_ms = duration_ms,
            "Remote call completed"
        );
    }
}
