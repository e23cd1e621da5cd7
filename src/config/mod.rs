//! Configuration management for DispatchBox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use dispatchbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `DISPATCHBOX__<section>__<key>`
//!
//! Examples:
//! - `DISPATCHBOX__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `DISPATCHBOX__DISPATCH__DEADLINE_SECS=600`
//! - `DISPATCHBOX__TARGETS__PACS__HTTP_PASSWORD=secret`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/dispatchbox.toml`.
//! This can be overridden using the `DISPATCHBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, DispatchSettings, GcpSettings, HttpSettings, ServerConfig};
pub use validation::ValidationError;

use std::sync::Arc;
use thiserror::Error;

use crate::dicomweb::GcpTokenSource;
use crate::handlers::HandlerSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`DISPATCHBOX__*`)
    /// 2. TOML file (default: `config/dispatchbox.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed or names an unknown target type
    /// - Validation fails (blank required fields, zero timeouts, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Settings for the built-in handlers
    pub fn handler_settings(&self) -> HandlerSettings {
        HandlerSettings {
            http: self.http.to_http_config(),
            healthcare_api_base: self.gcp.healthcare_api_base.clone(),
            token_source: Arc::new(GcpTokenSource::new(self.gcp.scopes.clone())),
        }
    }
}
