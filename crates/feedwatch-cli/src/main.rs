use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use feedwatch_core::MAX_TREND_DAYS;
use tracing_subscriber::EnvFilter;

mod changes;
mod trends;

#[derive(Debug, Parser)]
#[command(name = "feedwatch-cli")]
#[command(about = "Change detection and trend analytics for monitored feeds")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Diff an observed batch of items against recorded state
    Check {
        /// Source the batch was fetched from
        #[arg(long)]
        source: String,

        /// JSON file holding an array of observed items
        #[arg(long)]
        batch: PathBuf,

        /// Time of the previous check (RFC 3339)
        #[arg(long, value_parser = parse_since)]
        since: DateTime<Utc>,
    },
    /// Diff observed comments for one recorded item and describe its thread
    Comments {
        /// Internal id of the recorded item
        #[arg(long)]
        item_id: i64,

        /// JSON file holding an array of observed comments
        #[arg(long)]
        batch: PathBuf,
    },
    /// Build trend reports for one source or the whole watchlist
    Trends {
        /// Report on a single source
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        source: Option<String>,

        /// Report on every source in the watchlist
        #[arg(long)]
        all: bool,

        /// Analysis window in days (defaults to the configured window)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_TREND_DAYS)))]
        days: Option<u32>,
    },
    /// Rank recorded items in an observed batch by score velocity
    Trending {
        /// Source the batch was fetched from
        #[arg(long)]
        source: String,

        /// JSON file holding an array of observed items
        #[arg(long)]
        batch: PathBuf,

        /// Maximum number of items to print
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify the database is reachable
    Ping,
    /// Apply pending schema migrations
    Migrate,
}

fn parse_since(raw: &str) -> Result<DateTime<Utc>, String> {
    feedwatch_core::records::parse_timestamp(raw)
        .ok_or_else(|| format!("'{raw}' is not a recognised timestamp"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("feedwatch-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = feedwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = feedwatch_db::PoolConfig::from_app_config(&config);
    let pool = feedwatch_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Check {
            source,
            batch,
            since,
        } => changes::run_check(&pool, &source, &batch, since).await?,
        Commands::Comments { item_id, batch } => {
            changes::run_comments(&pool, item_id, &batch).await?;
        }
        Commands::Trends { source, all, days } => {
            trends::run_trends(&pool, &config, source.as_deref(), all, days).await?;
        }
        Commands::Trending {
            source,
            batch,
            limit,
        } => changes::run_trending(&pool, &source, &batch, limit).await?,
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                feedwatch_db::ping(&pool).await?;
                println!("database reachable");
            }
            DbCommands::Migrate => {
                let applied = feedwatch_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
    }

    Ok(())
}
