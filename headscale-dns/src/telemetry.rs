//! Logging setup for the headscale-dns binary.

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Level used when neither `RUST_LOG` nor a valid log level is provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level` (e.g. "info", "headscale_dns=debug,warn").
/// An invalid `log_level` falls back to [`DEFAULT_LOG_LEVEL`] and is reported
/// once the subscriber is installed.
pub fn init(log_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (env_filter, rejected) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => level_filter(log_level),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    if let Some(err) = rejected {
        tracing::warn!(
            log_level,
            error = %err,
            "invalid log level, falling back to {}",
            DEFAULT_LOG_LEVEL
        );
    }

    Ok(())
}

fn level_filter(log_level: &str) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_new(log_level) {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new(DEFAULT_LOG_LEVEL), Some(err)),
    }
}
