use std::fmt;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::model::{
    parse_known, parse_strict, AttackRange, ChampionClass, Gender, Region, Resource,
    UNKNOWN_SPECIES,
};
use crate::types::{AssetFailurePolicy, Locale, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "champsync", about = "Sync the champion catalog from public game data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub shared: SharedArgs,
}

/// Flags every subcommand understands.
#[derive(Args, Debug, Clone)]
pub struct SharedArgs {
    /// Catalog database file
    #[arg(long, global = true, env = "CHAMPSYNC_DB", default_value = "~/.champsync/catalog.db")]
    pub db: String,

    /// Root directory for downloaded images
    #[arg(
        long,
        global = true,
        env = "CHAMPSYNC_ASSETS_DIR",
        default_value = "~/.champsync/assets"
    )]
    pub assets_dir: String,

    /// Provider data language
    #[arg(long, global = true, value_enum, default_value = "en_US")]
    pub locale: Locale,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pull new and changed champions, then download their images
    Sync(SyncArgs),

    /// Show catalog counts, last sync and current version
    Status,

    /// List champions missing required data
    Incomplete {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Overwrite fields of one champion by hand
    Patch(PatchArgs),

    /// Re-download one champion's images against the latest version
    Refresh {
        /// Catalog id or display name
        #[arg(value_parser = parse_champion)]
        champion: ChampionRef,
    },
}

/// A champion named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChampionRef {
    Id(i64),
    /// Display name, matched case-insensitively.
    Name(String),
}

impl fmt::Display for ChampionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChampionRef::Id(id) => write!(f, "{id}"),
            ChampionRef::Name(name) => write!(f, "'{name}'"),
        }
    }
}

fn parse_champion(raw: &str) -> Result<ChampionRef, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("expected a catalog id or champion name".to_string());
    }
    Ok(match raw.parse::<i64>() {
        Ok(id) => ChampionRef::Id(id),
        Err(_) => ChampionRef::Name(raw.to_string()),
    })
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Only process the first N champions of the worklist
    #[arg(long)]
    pub limit: Option<usize>,

    /// Concurrent asset workers
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=64))]
    pub workers: u16,

    /// Ceiling on the whole asset stage, in seconds
    #[arg(long, default_value_t = 1800)]
    pub asset_timeout_secs: u64,

    /// What a failed image download means for the champion's status
    #[arg(long, value_enum, default_value = "continue")]
    pub asset_failure_policy: AssetFailurePolicy,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,

    /// Static champion detail file used as the last secondary source
    #[arg(long, env = "CHAMPSYNC_LOCAL_DETAILS")]
    pub local_details: Option<String>,

    /// URL prefix stored on champions for their images
    #[arg(long, default_value = crate::download::DEFAULT_PUBLIC_PREFIX)]
    pub public_prefix: String,

    /// Max retries per request (0 = no retries)
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{raw}': {e}"))
}

fn parse_species(raw: &str) -> Result<String, String> {
    let species = raw.trim();
    if species.is_empty() {
        return Err("species cannot be blank".to_string());
    }
    if species.eq_ignore_ascii_case(UNKNOWN_SPECIES) {
        return Err(format!(
            "species '{raw}' means unset and would be overwritten by the next sync"
        ));
    }
    Ok(species.to_string())
}

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Catalog id or display name
    #[arg(value_parser = parse_champion)]
    pub champion: ChampionRef,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_parser = parse_known::<Gender>)]
    pub gender: Option<Gender>,

    #[arg(long, value_parser = parse_strict::<ChampionClass>)]
    pub class: Option<ChampionClass>,

    /// Replaces all positions (repeatable)
    #[arg(long = "position")]
    pub positions: Vec<String>,

    /// Replaces all species (repeatable)
    #[arg(long = "species", value_parser = parse_species)]
    pub species: Vec<String>,

    /// Replaces all regions (repeatable)
    #[arg(long = "region", value_parser = parse_known::<Region>)]
    pub regions: Vec<Region>,

    #[arg(long, value_parser = parse_strict::<Resource>)]
    pub resource: Option<Resource>,

    #[arg(long, value_parser = parse_strict::<AttackRange>)]
    pub attack_range: Option<AttackRange>,

    /// Release date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub release_date: Option<NaiveDate>,
}
