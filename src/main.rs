use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

mod config;
mod db;
mod engine;
mod error;
mod export;
mod models;
mod probe;
mod services;

#[cfg(test)]
mod test_support;

use config::Config;
use db::Repository;
use engine::{Checker, RepairScheduler, RepairSelector, Scanner};
use error::{AppError, Result};
use export::Exporter;
use models::Platform;
use probe::{HttpProbe, PlatformResolvers};
use services::{AuthSession, ContentDiscovery, CookieSession, JsonFileDiscovery};

#[derive(Parser, Debug)]
#[command(name = "geo-catalog")]
#[command(about = "Find out which EITB streaming titles are geo-restricted")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database, overriding the configured path
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Log progress at info level
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store discovered items and probe the playable ones
    Scan {
        /// JSON file with the discovered items
        #[arg(long, value_name = "FILE")]
        items: PathBuf,

        /// Only scan one platform (primeran, makusi or etbon)
        #[arg(long)]
        platform: Option<Platform>,

        /// Scan at most this many items; a partial listing never marks items stale
        #[arg(long)]
        limit: Option<usize>,

        /// Refresh metadata without probing, e.g. when running behind a VPN
        #[arg(long, action = ArgAction::SetTrue)]
        disable_geo_check: bool,
    },
    /// Re-probe items whose restriction status is still unknown
    Repair {
        #[arg(long)]
        platform: Option<Platform>,

        /// Only repair these slugs (repeatable)
        #[arg(long = "slug", value_name = "SLUG")]
        slugs: Vec<String>,

        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the current restriction status, record and check history of an item
    Status { slug: String },
    /// Show episode verdict counts for a series
    Series { slug: String },
    /// Write content.json and geo_restricted.json
    Export {
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct StatusView {
    slug: String,
    item: Option<models::ContentItem>,
    status: Option<models::RestrictionStatus>,
    record: Option<models::RestrictionRecord>,
    history: Vec<models::CheckHistoryEntry>,
}

#[derive(Serialize)]
struct SeriesView {
    #[serde(flatten)]
    aggregate: models::SeriesAggregate,
    total: usize,
    overall: models::Verdict,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.db_path = db.to_string_lossy().to_string();
    }
    let store = Arc::new(Repository::new(&config.db_path).await?);

    match cli.command {
        Commands::Scan {
            items,
            platform,
            limit,
            disable_geo_check,
        } => {
            let mut discovered = JsonFileDiscovery::new(items)
                .for_platform(platform)
                .discover()
                .await?;
            if let Some(limit) = limit {
                discovered.truncate(limit);
            }
            let checker = build_checker(&config, disable_geo_check)?;
            let scanner = Scanner::new(checker, store, config.scan_settings(disable_geo_check));
            let report = scanner.run(discovered, limit.is_none()).await?;
            print_json(&report)?;
        }
        Commands::Repair {
            platform,
            slugs,
            limit,
        } => {
            let checker = build_checker(&config, false)?;
            let scheduler = RepairScheduler::new(
                checker,
                store,
                config.retry_policy(),
                config.max_concurrency,
            );
            let selector = RepairSelector {
                platform,
                slugs,
                limit,
            };
            let report = scheduler.repair(&selector).await?;
            print_json(&report)?;
        }
        Commands::Status { slug } => {
            let view = status_view(&store, &slug).await?;
            if view.item.is_none() && view.record.is_none() {
                return Err(AppError::NotFound(slug));
            }
            print_json(&view)?;
        }
        Commands::Series { slug } => {
            let aggregate = store.series_aggregate(&slug).await?;
            print_json(&SeriesView {
                total: aggregate.total(),
                overall: aggregate.overall(),
                aggregate,
            })?;
        }
        Commands::Export { output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.export_dir));
            let summary = Exporter::new(store, output_dir).export_all().await?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

/// Wires session, probe, resolvers and policy into a checker. Failing to build
/// the session aborts the run before any probe is sent.
fn build_checker(config: &Config, disable_geo_check: bool) -> Result<Arc<Checker>> {
    let resolvers = Arc::new(PlatformResolvers::new(&config.default_language));
    let client = if disable_geo_check {
        // no probe is sent, so no login is needed
        reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?
    } else {
        CookieSession::new(config.auth.session_cookies.clone())
            .with_user_agent(config.user_agent.clone())
            .with_connect_timeout(config.probe_timeout())
            .http_client()?
    };
    let probe = Arc::new(HttpProbe::new(client).with_timeout(config.probe_timeout()));
    Ok(Arc::new(Checker::new(
        resolvers,
        probe,
        config.classification_policy(),
    )))
}

async fn status_view(store: &Repository, slug: &str) -> Result<StatusView> {
    Ok(StatusView {
        slug: slug.to_string(),
        item: store.get_item(slug).await?,
        status: store.get_status(slug).await?,
        record: store.get_record(slug).await?,
        history: store.check_history(slug).await?,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
