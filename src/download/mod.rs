//! Asset retrieval: which images a champion needs, where they go, and the
//! per-champion download pass the sync workers run.

pub mod error;
pub mod file;
pub mod paths;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use error::DownloadError;
pub use file::{AssetFetcher, FetchOutcome};
pub use paths::{AssetLayout, DEFAULT_PUBLIC_PREFIX};

use crate::provider::{ChampionDetail, DataDragon};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Icon,
    Passive,
    Spell,
    Splash,
    Loading,
}

/// One image to fetch.
#[derive(Debug, Clone)]
pub struct AssetTask {
    pub kind: AssetKind,
    pub url: String,
    pub dest: PathBuf,
}

/// Outcome of one champion's download pass.
#[derive(Debug, Default)]
pub struct AssetReport {
    pub downloaded: u64,
    /// Bytes written by this pass; files already present count nothing.
    pub bytes: u64,
    pub already_present: u64,
    pub failed: Vec<AssetTask>,
    /// Whether the champion icon is on disk after the pass.
    pub icon_ok: bool,
    pub passive_ok: bool,
}

impl AssetReport {
    pub fn failed_count(&self) -> u64 {
        self.failed.len() as u64
    }
}

/// Every asset a champion needs for `version`, in a fixed order: icon,
/// passive, spells, then splash and loading art per skin.
pub fn plan_assets(
    ddragon: &DataDragon,
    layout: &AssetLayout,
    version: &str,
    detail: &ChampionDetail,
) -> Vec<AssetTask> {
    let id = detail.id.as_str();
    let mut tasks = Vec::with_capacity(2 + detail.spells.len() + detail.skins.len() * 2);

    tasks.push(AssetTask {
        kind: AssetKind::Icon,
        url: ddragon.champion_icon_url(version, id),
        dest: layout.icon_path(id),
    });

    if let Some(passive) = &detail.passive {
        if !passive.image.full.is_empty() {
            tasks.push(AssetTask {
                kind: AssetKind::Passive,
                url: ddragon.passive_icon_url(version, &passive.image.full),
                dest: layout.passive_path(id),
            });
        }
    }

    for spell in &detail.spells {
        if spell.image.full.is_empty() {
            continue;
        }
        tasks.push(AssetTask {
            kind: AssetKind::Spell,
            url: ddragon.spell_icon_url(version, &spell.image.full),
            dest: layout.spell_path(id, &spell.image.full),
        });
    }

    for skin in &detail.skins {
        tasks.push(AssetTask {
            kind: AssetKind::Splash,
            url: ddragon.splash_url(id, skin.num),
            dest: layout.splash_path(id, skin.num),
        });
        tasks.push(AssetTask {
            kind: AssetKind::Loading,
            url: ddragon.loading_url(id, skin.num),
            dest: layout.loading_path(id, skin.num),
        });
    }

    tasks
}

/// Fetch a champion's assets one after another.
///
/// Individual failures are recorded in the report. Only failing to create
/// the champion's directory aborts the pass.
pub async fn download_assets(
    fetcher: &AssetFetcher,
    champion_dir: &Path,
    tasks: &[AssetTask],
) -> Result<AssetReport, DownloadError> {
    tokio::fs::create_dir_all(champion_dir)
        .await
        .map_err(|e| DownloadError::disk(champion_dir, e))?;

    let mut report = AssetReport::default();
    for task in tasks {
        let outcome = fetcher.fetch(&task.url, &task.dest).await;
        let ok = outcome.is_success();
        match outcome {
            FetchOutcome::AlreadyPresent => report.already_present += 1,
            FetchOutcome::Downloaded { bytes } => {
                report.downloaded += 1;
                report.bytes += bytes;
            }
            FetchOutcome::Failed(e) => {
                tracing::warn!(
                    kind = ?task.kind,
                    url = %task.url,
                    status = ?e.status(),
                    error = %e,
                    "Asset download failed"
                );
                report.failed.push(task.clone());
            }
        }
        match task.kind {
            AssetKind::Icon => report.icon_ok = ok,
            AssetKind::Passive => report.passive_ok = ok,
            _ => {}
        }
    }
    Ok(report)
}

/// Create a progress bar with a consistent template.
///
/// Hidden when the user passed `--no-progress-bar` or stdout is not a TTY.
pub fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
