//! AsthmaCare patient record API core library
//!
//! This module exports the core functionality of the AsthmaCare API:
//! phone/PIN authentication, patient profiles, clinical records and
//! reference catalogs.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod security;

use std::sync::Arc;

use crate::notify::Notifier;

/// Shared application state injected into every handler.
pub struct AppState {
    pub db: db::Database,
    pub notifier: Arc<dyn Notifier>,
}

/// Application configuration
pub mod config {
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Config {
        pub server: ServerConfig,
        pub database: DatabaseConfig,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DatabaseConfig {
        pub url: String,
    }

    /// Load configuration from file
    pub fn load_config() -> Result<Config, config::ConfigError> {
        let env = std::env::var("ASTHMACARE_ENV").unwrap_or_else(|_| "development".into());

        let settings = config::Config::builder()
            // Start with default settings
            .add_source(config::File::with_name("config/default"))
            // Override with environment-specific settings
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("ASTHMACARE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
