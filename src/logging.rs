//! Logging setup.
//!
//! All logs go to **stderr**; stdout belongs to the host driving the
//! provider. Filtering follows `RUST_LOG`.
//!
//! ```bash
//! # Retry attempts and action polling
//! RUST_LOG=hcloud_network_provider=debug ./my-provider
//!
//! # Only give-ups and the attached-resources amnesty
//! RUST_LOG=warn ./my-provider
//! ```

use tracing_subscriber::{fmt, prelude::*, registry::LookupSpan, EnvFilter, Layer};

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Initialize the default logging subscriber at `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging, using `default_level` when `RUST_LOG` is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
///
/// # Example
///
/// ```ignore
/// use hcloud_network_provider::init_logging_with_default;
///
/// fn main() {
///     init_logging_with_default("debug");
///     tracing::debug!("Provider starting");
/// }
/// ```
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer())
        .init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Safe to call from tests that may share a process.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}
