//! Shared records, storage contract, and configuration for feedwatch.

pub mod app_config;
pub mod config;
pub mod records;
pub mod store;
pub mod watchlist;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, MAX_TREND_DAYS};
pub use records::{ObservedComment, ObservedItem, PersistedComment, PersistedItem};
pub use store::{StateReader, StoreError};
pub use watchlist::{load_watchlist, SourceConfig, Watchlist};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read watchlist file {path}: {source}")]
    WatchlistIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse watchlist file: {0}")]
    WatchlistParse(#[from] serde_yaml::Error),

    #[error("watchlist validation failed: {0}")]
    Validation(String),
}
