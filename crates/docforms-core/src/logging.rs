//! Logging integration.
//!
//! Configures [`tracing`] from [`Settings`](crate::settings::Settings) and
//! provides spans that tie log lines to a single form submission.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// `settings.log_level` is an `EnvFilter` directive. Debug mode uses the
/// pretty human-readable format; otherwise output is JSON. A second call is
/// a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
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

/// Creates a span covering the processing of one bound form.
///
/// # Examples
///
/// ```
/// use docforms_core::logging::form_span;
///
/// let span = form_span("ItemForm", "Item");
/// let _guard = span.enter();
/// tracing::debug!("binding submission");
/// ```
pub fn form_span(form: &str, document: &str) -> tracing::Span {
    tracing::debug_span!("form", form = form, document = document)
}

/// Creates a span for an HTTP request handled by an application.
pub fn request_span(method: &str, path: &str) -> tracing::Span {
    tracing::info_span!("request", method = method, path = path)
}
