//! Log subscriber setup for test runs.
//!
//! Hermes itself only emits `tracing` events. Call [`init_logging`] once at
//! the start of a test binary to see them.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_config::{logging::init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default())?;
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::{ConfigError, LogFormat, LoggingConfig};

/// Installs the global tracing subscriber described by `config`.
///
/// Does nothing when logging is disabled.
///
/// # Errors
///
/// Returns `ConfigError::LoggingInit` if the filter directive is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_ansi(false)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| ConfigError::LoggingInit(e.to_string()))?;
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_ansi(config.ansi_enabled)
                .with_filter(filter);

            tracing_subscriber::registry()
                .with(fmt_layer)
                .try_init()
                .map_err(|e| ConfigError::LoggingInit(e.to_string()))?;
        }
    }

    Ok(())
}

/// Creates an env filter from a directive string such as `hermes=debug,info`.
pub fn create_env_filter(filter: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(filter)
        .map_err(|e| ConfigError::LoggingInit(format!("invalid log level: {e}")))
}
