//! champsync: keeps a local champion catalog in step with the public game
//! data CDNs.
//!
//! A sync pulls the remote summary, merges authoritative and secondary
//! metadata for every new or stale champion, then downloads their images on
//! a bounded worker pool with a deadline. Admin commands report on and
//! correct the catalog.

#![warn(clippy::all)]

mod admin;
mod catalog;
mod cli;
mod completeness;
mod config;
mod detect;
mod download;
mod http;
mod mapper;
mod model;
mod patch;
mod provider;
pub mod retry;
mod sync;
mod types;

use std::collections::BTreeSet;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalog::{CatalogStore, SqliteCatalog};
use cli::{ChampionRef, Command, PatchArgs, SyncArgs};
use config::Config;

/// Exit status for "no such champion".
const EXIT_NOT_FOUND: i32 = 2;

fn not_found(champion: &ChampionRef) -> ! {
    eprintln!("Champion {} not found", champion);
    std::process::exit(EXIT_NOT_FOUND);
}

/// Catalog id of the champion named on the command line, if it exists.
async fn resolve_champion(
    catalog: &dyn CatalogStore,
    champion: &ChampionRef,
) -> Result<Option<i64>, catalog::StoreError> {
    let found = match champion {
        ChampionRef::Id(id) => catalog.get(*id).await?,
        ChampionRef::Name(name) => catalog.find_by_name(name).await?,
    };
    Ok(found.and_then(|c| c.id))
}

async fn open_catalog(config: &Config) -> anyhow::Result<Arc<SqliteCatalog>> {
    let db = SqliteCatalog::open(&config.db_path).await?;
    tracing::debug!(path = %db.path().display(), "Catalog opened");
    Ok(Arc::new(db))
}

/// Wire up providers, fetcher and stores into an engine.
async fn build_engine(config: &Config, db: Arc<SqliteCatalog>) -> anyhow::Result<sync::SyncEngine> {
    let client = http::build_client(http::DEFAULT_USER_AGENT, config::REQUEST_TIMEOUT)?;
    let session: Arc<dyn http::HttpSession> = Arc::new(client);

    let local = match &config.local_details {
        Some(path) => provider::LocalDetails::load(path).await,
        None => provider::LocalDetails::empty(),
    };
    if local.is_empty() {
        tracing::debug!("No local champion details; secondary data comes from the CDNs only");
    }
    let remote = provider::RemoteCatalog::new(session.clone(), config.retry(), local);
    let fetcher = download::AssetFetcher::new(session, config.retry());

    Ok(sync::SyncEngine::new(
        db.clone(),
        db,
        Arc::new(remote),
        fetcher,
        config.layout(),
        config.sync_settings(),
    ))
}

async fn run_sync(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        locale = %config.locale,
        workers = config.workers,
        assets = %config.assets_dir.display(),
        "Starting champsync"
    );
    let db = open_catalog(&config).await?;
    let engine = build_engine(&config, db).await?;
    let stats = engine.run().await?;
    if stats.incomplete > 0 {
        tracing::warn!(
            incomplete = stats.incomplete,
            "Some champions are incomplete; run `champsync incomplete` for details"
        );
    }
    Ok(())
}

async fn run_status(config: Config) -> anyhow::Result<()> {
    let db = open_catalog(&config).await?;
    let stats = admin::catalog_stats(db.as_ref(), db.as_ref()).await?;

    println!("Catalog: {}", config.db_path.display());
    println!();
    println!("Champions:");
    println!("  Total:      {}", stats.total);
    println!("  Complete:   {}", stats.complete);
    println!("  Incomplete: {}", stats.incomplete);
    println!();
    println!("Current version: {}", stats.current_version);
    let Some(run) = &stats.last_run else {
        println!("Last sync:       never");
        return Ok(());
    };
    const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
    println!("Last sync:       run #{}", run.id);
    println!("  Started:   {}", run.started_at.format(TIME_FORMAT));
    if let Some(at) = run.completed_at {
        println!("  Completed: {}", at.format(TIME_FORMAT));
    }
    println!("  Version:   {}", run.stats.remote_version);
    println!(
        "  Worklist:  {} ({} ready, {} incomplete, {} metadata failures, {} timed out)",
        run.stats.worklist,
        run.stats.ready,
        run.stats.incomplete,
        run.stats.metadata_failed,
        run.stats.timed_out
    );
    println!(
        "  Assets:    {} downloaded, {} failed",
        run.stats.assets_downloaded, run.stats.assets_failed
    );
    Ok(())
}

async fn run_incomplete(config: Config, json: bool) -> anyhow::Result<()> {
    let db = open_catalog(&config).await?;
    let entries = admin::incomplete_entries(db.as_ref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("All champions are complete.");
        return Ok(());
    }
    println!("Incomplete champions:");
    for entry in &entries {
        println!(
            "  {:>5}  {:<20} {:<16} missing: {}",
            entry.id.map(|id| id.to_string()).unwrap_or_default(),
            entry.name,
            entry.status,
            entry.missing.join(", ")
        );
    }
    println!();
    println!("{} incomplete", entries.len());
    Ok(())
}

fn patch_from_args(args: &PatchArgs) -> patch::ChampionPatch {
    fn set<T: Ord + Clone>(values: &[T]) -> Option<BTreeSet<T>> {
        (!values.is_empty()).then(|| values.iter().cloned().collect())
    }
    let positions: Vec<String> = args.positions.iter().map(|p| model::normalize(p)).collect();
    let species: Vec<String> = args.species.iter().map(|s| s.trim().to_string()).collect();

    patch::ChampionPatch {
        description: args.description.clone(),
        gender: args.gender,
        class: args.class,
        positions: set(&positions),
        species: set(&species),
        regions: set(&args.regions),
        resource: args.resource,
        attack_range: args.attack_range,
        release_date: args.release_date,
    }
}

async fn run_patch(config: Config, args: PatchArgs) -> anyhow::Result<()> {
    let changes = patch_from_args(&args);
    if changes.is_empty() {
        println!("No fields given; nothing to patch.");
        return Ok(());
    }
    let db = open_catalog(&config).await?;
    let Some(id) = resolve_champion(db.as_ref(), &args.champion).await? else {
        not_found(&args.champion);
    };
    match patch::apply_patch(db.as_ref(), id, &changes).await {
        Ok(champion) => {
            println!("{}", serde_json::to_string_pretty(&champion)?);
            Ok(())
        }
        Err(e) if e.is_not_found() => not_found(&args.champion),
        Err(e) => Err(e.into()),
    }
}

async fn run_refresh(config: Config, champion: ChampionRef) -> anyhow::Result<()> {
    let db = open_catalog(&config).await?;
    let Some(id) = resolve_champion(db.as_ref(), &champion).await? else {
        not_found(&champion);
    };
    let engine = build_engine(&config, db).await?;
    match engine.refresh(id).await {
        Ok(refreshed) => {
            println!("{} is now {}", refreshed.name, refreshed.sync_status);
            Ok(())
        }
        Err(e) if e.is_not_found() => not_found(&champion),
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.shared.log_level.as_filter())),
        )
        .init();

    let sync_args: Option<&SyncArgs> = match &cli.command {
        Command::Sync(args) => Some(args),
        _ => None,
    };
    let config = Config::from_cli(&cli.shared, sync_args)?;

    match cli.command {
        Command::Sync(_) => run_sync(config).await,
        Command::Status => run_status(config).await,
        Command::Incomplete { json } => run_incomplete(config, json).await,
        Command::Patch(args) => run_patch(config, args).await,
        Command::Refresh { champion } => run_refresh(config, champion).await,
    }
}
