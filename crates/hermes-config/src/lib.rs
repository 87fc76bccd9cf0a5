//! Typed configuration for the Hermes API test client.
//!
//! This crate provides:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Logging setup driven by the `[logging]` section
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::{logging::init_logging, ConfigLoader};
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! init_logging(&config.logging)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [client]
//! base_url = "http://localhost:3333"
//! dump_requests = false
//! user_agent = "hermes"
//!
//! [client.default_headers]
//! accept = "application/json"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
pub mod logging;

pub use config::{ClientConfig, HermesConfig, LogFormat, LoggingConfig};
pub use error::ConfigError;
pub use loader::ConfigLoader;
