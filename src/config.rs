//! Configuration loader for the `vegwatch` dashboard service.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). Consolidating the `env::var` calls here
//! keeps the rest of the codebase free of ad-hoc environment lookups.

use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Base URL of the remote imagery analysis service.
    pub imagery_api_url: String,

    /// Directory where map and chart artifacts are written; served at /static.
    pub static_dir: String,

    /// Scenes with cloud coverage at or above this percentage are excluded.
    pub max_cloud_pct: u32,

    /// Optional JSON file overriding the built-in dashboard texts.
    pub texts_path: Option<String>,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `IMAGERY_API_URL` – base URL of the imagery analysis service
///
/// Optional:
/// - `STATIC_DIR` – artifact output directory (default: `static`)
/// - `MAX_CLOUD_PCT` – cloud coverage cutoff in percent (default: 20)
/// - `DASHBOARD_TEXTS_PATH` – JSON override for explanation/conclusion texts
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let imagery_api_url = require_env!("IMAGERY_API_URL");
    let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".into());
    let max_cloud_pct = parse_env_u32!("MAX_CLOUD_PCT", 20);
    let texts_path = env::var("DASHBOARD_TEXTS_PATH").ok();

    Ok(Config {
        imagery_api_url,
        static_dir,
        max_cloud_pct,
        texts_path,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  IMAGERY_API_URL      : {}", self.imagery_api_url);
        tracing::info!("  STATIC_DIR           : {}", self.static_dir);
        tracing::info!("  MAX_CLOUD_PCT        : {}", self.max_cloud_pct);
        tracing::info!(
            "  DASHBOARD_TEXTS_PATH : {}",
            self.texts_path.as_deref().unwrap_or("(built-in defaults)")
        );
    }
}
