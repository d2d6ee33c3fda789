//! Logging integration for adminkit.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`AdminSettings`] and for creating per-request spans.

use crate::settings::AdminSettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` and accepts any
/// `EnvFilter` directive (e.g. "debug" or "adminkit_admin=debug,info").
/// In debug mode a pretty, human-readable format is used; otherwise a
/// structured JSON format is used. Calling this twice is harmless.
pub fn setup_logging(settings: &AdminSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one admin request.
///
/// # Examples
///
/// ```
/// use adminkit_core::logging::request_span;
///
/// let span = request_span("GET", "/admin/user/list");
/// let _guard = span.enter();
/// tracing::info!("rendering list");
/// ```
pub fn request_span(method: &str, path: &str) -> tracing::Span {
    tracing::info_span!("admin_request", method = method, path = path)
}
