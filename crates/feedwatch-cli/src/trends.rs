//! Trend report command handler.

use feedwatch_changes::{ChangeDetector, TrendReport};
use feedwatch_core::{load_watchlist, AppConfig};
use feedwatch_db::PgStateReader;

use crate::changes::print_json;

/// Sources and windows to report on, in watchlist order.
///
/// An explicit `--days` overrides both per-source windows and the configured default.
fn report_targets(
    config: &AppConfig,
    source: Option<&str>,
    all: bool,
    days: Option<u32>,
) -> anyhow::Result<Vec<(String, u32)>> {
    if let (Some(name), false) = (source, all) {
        return Ok(vec![(name.to_string(), days.unwrap_or(config.trend_days))]);
    }

    let watchlist = load_watchlist(&config.watchlist_path)?;
    if watchlist.sources.is_empty() {
        anyhow::bail!(
            "watchlist {} has no sources",
            config.watchlist_path.display()
        );
    }
    Ok(watchlist
        .sources
        .iter()
        .map(|s| {
            (
                s.name.clone(),
                days.unwrap_or_else(|| s.window_days(config.trend_days)),
            )
        })
        .collect())
}

/// Build and print trend reports.
///
/// # Errors
///
/// Returns an error if the watchlist cannot be loaded or output cannot be serialized.
/// Per-source analysis failures surface as empty reports, not errors.
pub(crate) async fn run_trends(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    source: Option<&str>,
    all: bool,
    days: Option<u32>,
) -> anyhow::Result<()> {
    let targets = report_targets(config, source, all, days)?;
    let detector = ChangeDetector::new(PgStateReader::new(pool.clone()));

    let mut reports: Vec<TrendReport> = Vec::with_capacity(targets.len());
    for (name, window) in &targets {
        let report = detector.trend_report(name, *window).await;
        tracing::info!(
            source = %name,
            days = window,
            total_posts = report.total_posts,
            pattern = %report.activity_pattern,
            "trend report ready"
        );
        reports.push(report);
    }

    match (all, reports.as_slice()) {
        (false, [report]) => print_json(report),
        _ => print_json(&reports),
    }
}
