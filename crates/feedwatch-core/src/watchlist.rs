use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::MAX_TREND_DAYS;
use crate::ConfigError;

/// One tracked source (a subreddit, forum, or topic feed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Overrides the configured default analysis window for this source.
    #[serde(default)]
    pub trend_days: Option<u32>,
}

impl SourceConfig {
    /// Analysis window for this source, falling back to `default_days`.
    #[must_use]
    pub fn window_days(&self, default_days: u32) -> u32 {
        self.trend_days.unwrap_or(default_days)
    }
}

#[derive(Debug, Deserialize)]
pub struct Watchlist {
    pub sources: Vec<SourceConfig>,
}

/// Load and validate the watchlist from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_watchlist(path: &Path) -> Result<Watchlist, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::WatchlistIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let watchlist: Watchlist = serde_yaml::from_str(&content)?;

    validate_watchlist(&watchlist)?;

    Ok(watchlist)
}

fn validate_watchlist(watchlist: &Watchlist) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for source in &watchlist.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name must be non-empty".to_string(),
            ));
        }

        if let Some(days) = source.trend_days {
            if days == 0 || days > MAX_TREND_DAYS {
                return Err(ConfigError::Validation(format!(
                    "source '{}' has invalid trend_days {days}; must be 1..={MAX_TREND_DAYS}",
                    source.name
                )));
            }
        }

        if !seen.insert(source.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name: '{}'",
                source.name
            )));
        }
    }

    Ok(())
}
