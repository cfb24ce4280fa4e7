//! Structured logging bootstrap.
//!
//! Library code only emits `tracing` events. Binaries and test harnesses call
//! [`init_tracing`] once to install a subscriber that writes compact lines to
//! stderr, filtered by `RUST_LOG` or the configured default directive.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when neither `RUST_LOG` nor configuration provide one.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` when a
/// global subscriber was already installed, in which case nothing changes.
pub fn init_tracing(default_filter: Option<&str>) -> bool {
    let fallback = default_filter.unwrap_or(DEFAULT_LOG_FILTER);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn second_initialisation_is_a_no_op() {
        let _ = init_tracing(Some("gantry=debug"));
        assert!(!init_tracing(None));
    }
}
