//! Logging setup.
//!
//! The plugin writes every log line to **stderr**; stdout carries the
//! handshake line the host reads on startup and nothing else.
//!
//! `RUST_LOG` controls filtering, e.g.
//!
//! ```bash
//! RUST_LOG=equinix_provider=debug ./equinix-provider
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

fn filter_or(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Install the global subscriber, falling back to `default_level` when
/// `RUST_LOG` is unset.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging_with_default(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter_or(default_level))
        .with(stderr_layer())
        .try_init()
        .is_ok()
}

/// Install the global subscriber with the [`DEFAULT_FILTER`].
pub fn init_logging() -> bool {
    init_logging_with_default(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        assert!(EnvFilter::try_new("equinix_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,equinix_provider::metal=trace").is_ok());
    }

    #[test]
    fn test_second_init_reports_already_installed() {
        let _ = init_logging_with_default("debug");
        assert!(!init_logging());
    }
}
