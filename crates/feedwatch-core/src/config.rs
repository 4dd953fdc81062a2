use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Largest analysis window accepted for trend reports, in days.
pub const MAX_TREND_DAYS: u32 = 365;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

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

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("FEEDWATCH_ENV", "development"));
    let log_level = or_default("FEEDWATCH_LOG_LEVEL", "info");
    let watchlist_path = PathBuf::from(or_default(
        "FEEDWATCH_WATCHLIST_PATH",
        "./config/watchlist.yaml",
    ));

    let db_max_connections = parse_u32("FEEDWATCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FEEDWATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FEEDWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let trend_days = parse_u32("FEEDWATCH_TREND_DAYS", "7")?;
    if trend_days == 0 || trend_days > MAX_TREND_DAYS {
        return Err(ConfigError::InvalidEnvVar {
            var: "FEEDWATCH_TREND_DAYS".to_string(),
            reason: format!("must be between 1 and {MAX_TREND_DAYS}, got {trend_days}"),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        watchlist_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        trend_days,
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

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
