//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays free for badge and JSON output.
//! `RUST_LOG`, when set, replaces the configured filter.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Logging initialization errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber is already installed.
    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Build the filter, preferring `env_override` over `configured`.
fn build_filter(env_override: Option<&str>, configured: &str) -> Result<EnvFilter, LoggingError> {
    let directives = env_override
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(configured);
    EnvFilter::try_new(directives).map_err(|source| LoggingError::InvalidFilter {
        filter: directives.to_string(),
        source,
    })
}

/// Install the global subscriber.
///
/// # Errors
/// Returns `LoggingError` for a bad filter or a second initialization.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), &config.filter)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}
