use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read locations file {path}: {source}")]
    LocationsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse locations file: {0}")]
    LocationsFileParse(#[from] serde_yaml::Error),

    #[error("invalid locations file: {0}")]
    Validation(String),
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any configured value fails to parse.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if any configured value fails to parse.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup
/// function. Decoupled from the real environment so it can be tested with a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f32 = |var: &str, default: &str| -> Result<f32, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a positive number, got {raw}"),
            })
        }
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got {other}"),
            }),
        }
    };

    let env = parse_environment(&or_default("SKYSYNC_ENV", "development"));
    let log_level = or_default("SKYSYNC_LOG_LEVEL", "info");
    let locations_path = PathBuf::from(or_default(
        "SKYSYNC_LOCATIONS_PATH",
        "./config/locations.yaml",
    ));
    let cache_dir = PathBuf::from(or_default("SKYSYNC_CACHE_DIR", "./cache"));
    let artifact_dir = PathBuf::from(or_default("SKYSYNC_ARTIFACT_DIR", "./artifacts"));

    let refresh_validity_hours = parse_f32("SKYSYNC_REFRESH_VALIDITY_HOURS", "0.25")?;
    let refresh_max_concurrent_sources = parse_usize("SKYSYNC_REFRESH_MAX_CONCURRENT_SOURCES", "5")?;
    let refresh_ignore_freshness = parse_bool("SKYSYNC_REFRESH_IGNORE_FRESHNESS", "false")?;
    let notify_skipped = parse_bool("SKYSYNC_NOTIFY_SKIPPED", "false")?;

    let source_request_timeout_secs = parse_u64("SKYSYNC_SOURCE_REQUEST_TIMEOUT_SECS", "30")?;
    let source_user_agent = or_default("SKYSYNC_SOURCE_USER_AGENT", "skysync/0.1 (weather-refresh)");
    let source_max_retries = parse_u32("SKYSYNC_SOURCE_MAX_RETRIES", "3")?;
    let source_retry_backoff_base_ms = parse_u64("SKYSYNC_SOURCE_RETRY_BACKOFF_BASE_MS", "1000")?;
    let source_api_key = lookup("SKYSYNC_SOURCE_API_KEY").ok();

    Ok(AppConfig {
        env,
        log_level,
        locations_path,
        cache_dir,
        artifact_dir,
        refresh_validity_hours,
        refresh_max_concurrent_sources,
        refresh_ignore_freshness,
        notify_skipped,
        source_request_timeout_secs,
        source_user_agent,
        source_max_retries,
        source_retry_backoff_base_ms,
        source_api_key,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
