//! Logging integration for kilnqa.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-page and
//! per-form spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug" or
/// "`kilnqa_drafts=debug`"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format is used. Installing twice is a
/// no-op.
pub fn setup_logging(settings: &Settings) {
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

/// Creates a tracing span for one rendered page.
///
/// # Examples
///
/// ```
/// use kilnqa_core::logging::page_span;
///
/// let span = page_span("/production/create");
/// let _guard = span.enter();
/// tracing::info!("page ready");
/// ```
pub fn page_span(path: &str) -> tracing::Span {
    tracing::info_span!("page", path = path)
}

/// Creates a tracing span for work on one form.
pub fn form_span(form_id: &str) -> tracing::Span {
    tracing::debug_span!("form", id = form_id)
}
