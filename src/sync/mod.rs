//! Sync orchestration: one run pulls the remote catalog, merges metadata
//! sequentially, then downloads assets on a bounded worker pool.
//!
//! Per-champion failures end up as an `INCOMPLETE` status and a log line.
//! Only failing to reach the version or summary endpoints aborts a run, and
//! that happens before anything is written.

pub mod pool;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::catalog::{CatalogStore, StoreError, SyncRunStats, VersionStore};
use crate::completeness;
use crate::detect;
use crate::download::{self, AssetFetcher, AssetLayout, AssetReport, DownloadError};
use crate::mapper;
use crate::model::{Champion, SyncStatus};
use crate::provider::{ChampionDetail, ProviderError, RemoteCatalog, RunLookups, SummaryEntry};
use crate::types::AssetFailurePolicy;

/// Settings key holding the last fully synced remote version.
pub const VERSION_KEY: &str = "LOL_VERSION";

/// What [`current_version`] reports before the first run.
pub const DEFAULT_VERSION: &str = "0.0.0";

pub const DEFAULT_WORKERS: usize = 10;

pub const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Champion {0} not found")]
    NotFound(i64),
}

impl SyncError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
    }
}

/// The last fully synced remote version, or `0.0.0`.
pub async fn current_version(versions: &dyn VersionStore) -> Result<String, StoreError> {
    Ok(versions
        .get_setting(VERSION_KEY)
        .await?
        .unwrap_or_else(|| DEFAULT_VERSION.to_string()))
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub locale: String,
    pub workers: usize,
    pub asset_timeout: Duration,
    pub failure_policy: AssetFailurePolicy,
    /// Only consider the first N worklist ids.
    pub limit: Option<usize>,
    pub no_progress_bar: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            locale: "en_US".to_string(),
            workers: DEFAULT_WORKERS,
            asset_timeout: DEFAULT_ASSET_TIMEOUT,
            failure_policy: AssetFailurePolicy::Continue,
            limit: None,
            no_progress_bar: false,
        }
    }
}

/// A champion whose metadata stage succeeded, waiting for its assets.
struct Staged {
    champion: Champion,
    detail: ChampionDetail,
}

/// Final status after an asset pass. READY needs a clean pass under the
/// configured policy and a complete champion.
fn decide_status(
    champion: &Champion,
    report: &AssetReport,
    policy: AssetFailurePolicy,
) -> SyncStatus {
    if policy == AssetFailurePolicy::MarkIncomplete && report.failed_count() > 0 {
        return SyncStatus::Incomplete;
    }
    if completeness::is_complete(champion) {
        SyncStatus::Ready
    } else {
        SyncStatus::Incomplete
    }
}

/// Record asset URLs for images that are on disk.
fn apply_report(champion: &mut Champion, report: &AssetReport, layout: &AssetLayout, id: &str) {
    if report.icon_ok {
        champion.icon_url = Some(layout.icon_url(id));
    }
    if report.passive_ok && champion.passive_icon_url.is_none() {
        champion.passive_icon_url = Some(layout.passive_url(id));
    }
}

/// Serializes the final write of each asset task against the deadline.
///
/// Once `closed` fires no task may write; everything not in `finalized` at
/// that point is a straggler and belongs to the orchestrator.
struct FinalizeGate {
    closed: CancellationToken,
    finalized: tokio::sync::Mutex<Finalized>,
}

#[derive(Debug, Default, Clone)]
struct Finalized {
    saved: HashMap<i64, SyncStatus>,
    /// Finished in time, but the final write failed.
    unsaved: HashSet<i64>,
}

#[derive(Debug, Default)]
struct AssetTally {
    downloaded: u64,
    bytes: u64,
    failed: u64,
}

/// Everything an asset worker needs, shared across the pool.
struct AssetStage {
    catalog: Arc<dyn CatalogStore>,
    remote: Arc<RemoteCatalog>,
    fetcher: AssetFetcher,
    layout: AssetLayout,
    version: String,
    policy: AssetFailurePolicy,
    gate: FinalizeGate,
    progress: ProgressBar,
}

impl AssetStage {
    async fn run_one(&self, staged: Staged) -> AssetTally {
        let Staged {
            mut champion,
            detail,
        } = staged;
        let id = detail.id.clone();
        let tasks = download::plan_assets(&self.remote.ddragon, &self.layout, &self.version, &detail);
        let champion_dir = self.layout.champion_dir(&id);

        let mut tally = AssetTally::default();
        champion.sync_status = match download::download_assets(&self.fetcher, &champion_dir, &tasks).await {
            Ok(report) => {
                tally.downloaded = report.downloaded;
                tally.bytes = report.bytes;
                tally.failed = report.failed_count();
                apply_report(&mut champion, &report, &self.layout, &id);
                decide_status(&champion, &report, self.policy)
            }
            Err(e) => {
                self.progress
                    .suspend(|| tracing::warn!(champion = %id, error = %e, "Asset stage failed"));
                SyncStatus::Incomplete
            }
        };

        self.finalize(&champion, &id, &tally).await;
        self.progress.inc(1);
        tally
    }

    /// Write the champion's final status unless the deadline got there first.
    async fn finalize(&self, champion: &Champion, id: &str, tally: &AssetTally) {
        let Some(row_id) = champion.id else {
            return;
        };
        let mut finalized = self.gate.finalized.lock().await;
        if self.gate.closed.is_cancelled() {
            tracing::debug!(champion = %id, "Asset task finished after deadline, discarding");
            return;
        }
        match self.catalog.save(champion).await {
            Ok(_) => {
                finalized.saved.insert(row_id, champion.sync_status);
                tracing::debug!(
                    champion = %id,
                    status = %champion.sync_status,
                    downloaded = tally.downloaded,
                    bytes = tally.bytes,
                    "Asset stage done"
                );
            }
            Err(e) => {
                finalized.unsaved.insert(row_id);
                tracing::error!(champion = %id, error = %e, "Failed to persist asset stage");
            }
        }
    }
}

pub struct SyncEngine {
    catalog: Arc<dyn CatalogStore>,
    versions: Arc<dyn VersionStore>,
    remote: Arc<RemoteCatalog>,
    fetcher: AssetFetcher,
    layout: AssetLayout,
    settings: SyncSettings,
}

impl SyncEngine {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        versions: Arc<dyn VersionStore>,
        remote: Arc<RemoteCatalog>,
        fetcher: AssetFetcher,
        layout: AssetLayout,
        settings: SyncSettings,
    ) -> Self {
        Self {
            catalog,
            versions,
            remote,
            fetcher,
            layout,
            settings,
        }
    }

    /// Run a full sync and return its statistics.
    pub async fn run(&self) -> Result<SyncRunStats, SyncError> {
        let started = Instant::now();
        let locale = self.settings.locale.as_str();

        let remote_version = self.remote.ddragon.latest_version().await?;
        let summary = self.remote.ddragon.summary(&remote_version, locale).await?;
        let stored_version = current_version(self.versions.as_ref()).await?;
        let local = self.catalog.list_all().await?;

        let mut worklist = detect::compute_worklist(&summary, &local, &remote_version);
        if let Some(limit) = self.settings.limit {
            worklist.truncate(limit);
        }
        tracing::info!(
            remote_version = %remote_version,
            stored_version = %stored_version,
            remote = summary.len(),
            local = local.len(),
            worklist = worklist.len(),
            "Computed worklist"
        );

        let run_id = self.versions.start_sync_run().await?;
        let mut stats = SyncRunStats {
            remote_version: remote_version.clone(),
            worklist: worklist.len() as u64,
            ..SyncRunStats::default()
        };

        let mut by_name: HashMap<String, Champion> = local
            .into_iter()
            .map(|c| (c.name.to_lowercase(), c))
            .collect();

        // Metadata: strictly sequential, sharing the run's lookup tables.
        let lookups = self.remote.prepare_run().await;
        let mut staged = Vec::with_capacity(worklist.len());
        for id in &worklist {
            let Some(entry) = summary.get(id) else {
                continue;
            };
            let existing = by_name.remove(&entry.name.to_lowercase());
            match self
                .sync_metadata(entry, existing, &remote_version, &lookups)
                .await
            {
                Some(s) => staged.push(s),
                None => stats.metadata_failed += 1,
            }
        }

        // Assets: bounded pool with a ceiling on the whole stage.
        let pending: Vec<(i64, String)> = staged
            .iter()
            .filter_map(|s| s.champion.id.map(|id| (id, s.detail.id.clone())))
            .collect();
        let stage = Arc::new(AssetStage {
            catalog: self.catalog.clone(),
            remote: self.remote.clone(),
            fetcher: self.fetcher.clone(),
            layout: self.layout.clone(),
            version: remote_version.clone(),
            policy: self.settings.failure_policy,
            gate: FinalizeGate {
                closed: CancellationToken::new(),
                finalized: tokio::sync::Mutex::new(Finalized::default()),
            },
            progress: download::create_progress_bar(
                self.settings.no_progress_bar,
                staged.len() as u64,
            ),
        });

        let job_stage = stage.clone();
        let outcome = pool::run_bounded(
            staged,
            self.settings.workers,
            self.settings.asset_timeout,
            stage.gate.closed.clone(),
            move |s: Staged| {
                let stage = job_stage.clone();
                async move { stage.run_one(s).await }
            },
        )
        .await;
        stage.progress.finish_and_clear();

        for tally in &outcome.results {
            stats.assets_downloaded += tally.downloaded;
            stats.assets_failed += tally.failed;
        }

        let finalized = {
            let guard = stage.gate.finalized.lock().await;
            stage.gate.closed.cancel();
            guard.clone()
        };
        if outcome.timed_out {
            tracing::warn!(
                timeout_secs = self.settings.asset_timeout.as_secs(),
                "Asset stage hit its deadline, abandoning stragglers"
            );
        }

        for (row_id, remote_id) in &pending {
            if finalized.saved.contains_key(row_id) {
                continue;
            }
            if !finalized.unsaved.contains(row_id) && outcome.timed_out {
                stats.timed_out += 1;
            }
            stats.incomplete += 1;
            self.mark_incomplete(*row_id, remote_id).await;
        }
        for status in finalized.saved.values() {
            match status {
                SyncStatus::Ready => stats.ready += 1,
                _ => stats.incomplete += 1,
            }
        }
        stats.incomplete += stats.metadata_failed;

        // The version advances even when some champions ended INCOMPLETE;
        // they are picked up again by the next run.
        self.versions
            .set_setting(VERSION_KEY, &remote_version)
            .await?;
        self.versions.complete_sync_run(run_id, &stats).await?;

        tracing::info!("── Summary ──");
        tracing::info!(
            "  {} ready, {} incomplete ({} metadata failures, {} timed out)",
            stats.ready,
            stats.incomplete,
            stats.metadata_failed,
            stats.timed_out
        );
        tracing::info!(
            "  {} assets downloaded, {} failed",
            stats.assets_downloaded,
            stats.assets_failed
        );
        tracing::info!("  version: {}", remote_version);
        tracing::info!("  elapsed: {}", download::format_duration(started.elapsed()));

        Ok(stats)
    }

    /// Metadata stage for one champion. Returns `None` when the champion
    /// could not be staged for assets; it has been persisted `INCOMPLETE`
    /// where possible.
    async fn sync_metadata(
        &self,
        entry: &SummaryEntry,
        existing: Option<Champion>,
        version: &str,
        lookups: &RunLookups,
    ) -> Option<Staged> {
        let mut champion = match existing {
            Some(c) => c,
            None => {
                let mut fresh = Champion::detected(entry.name.clone());
                mapper::apply_summary(&mut fresh, entry);
                match self.catalog.save(&fresh).await {
                    Ok(saved) => {
                        tracing::info!(champion = %entry.id, id = ?saved.id, "New champion detected");
                        saved
                    }
                    Err(e) => {
                        tracing::error!(champion = %entry.id, error = %e, "Failed to record new champion");
                        return None;
                    }
                }
            }
        };
        mapper::apply_summary(&mut champion, entry);

        let detail = match self
            .remote
            .ddragon
            .detail(version, &self.settings.locale, &entry.id)
            .await
        {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(champion = %entry.id, error = %e, "Metadata sync failed");
                champion.sync_status = SyncStatus::Incomplete;
                if let Err(e) = self.catalog.save(&champion).await {
                    tracing::error!(champion = %entry.id, error = %e, "Failed to persist INCOMPLETE");
                }
                return None;
            }
        };

        let secondary = self.remote.supplements(lookups, entry).await;
        mapper::merge(
            &mut champion,
            &detail,
            &secondary,
            &self.layout.public_base(&entry.id),
        );
        champion.version = Some(version.to_string());
        champion.sync_status = SyncStatus::MetadataSynced;

        match self.catalog.save(&champion).await {
            Ok(saved) => {
                tracing::debug!(
                    champion = %entry.id,
                    sources = secondary.len(),
                    missing = ?completeness::missing_fields(&saved),
                    "Metadata synced"
                );
                Some(Staged {
                    champion: saved,
                    detail,
                })
            }
            Err(e) => {
                tracing::error!(champion = %entry.id, error = %e, "Failed to persist metadata");
                None
            }
        }
    }

    async fn mark_incomplete(&self, row_id: i64, remote_id: &str) {
        let result = async {
            if let Some(mut champion) = self.catalog.get(row_id).await? {
                champion.sync_status = SyncStatus::Incomplete;
                self.catalog.save(&champion).await?;
            }
            Ok::<_, StoreError>(())
        }
        .await;
        match result {
            Ok(()) => tracing::warn!(champion = %remote_id, "Asset task did not finish, marked INCOMPLETE"),
            Err(e) => tracing::error!(champion = %remote_id, error = %e, "Failed to mark INCOMPLETE"),
        }
    }

    /// Re-download one champion's assets against the latest version.
    ///
    /// Any provider, disk or store error is returned and leaves the stored
    /// champion as it was. Individual image failures follow the policy.
    pub async fn refresh(&self, id: i64) -> Result<Champion, SyncError> {
        let mut champion = self
            .catalog
            .get(id)
            .await?
            .ok_or(SyncError::NotFound(id))?;

        let version = self.remote.ddragon.latest_version().await?;
        let remote_id = champion.provider_id();
        let detail = self
            .remote
            .ddragon
            .detail(&version, &self.settings.locale, &remote_id)
            .await?;

        let tasks = download::plan_assets(&self.remote.ddragon, &self.layout, &version, &detail);
        let report = download::download_assets(
            &self.fetcher,
            &self.layout.champion_dir(&remote_id),
            &tasks,
        )
        .await?;

        if champion.remote_id.is_none() {
            champion.remote_id = Some(remote_id.clone());
        }
        apply_report(&mut champion, &report, &self.layout, &remote_id);
        champion.sync_status = decide_status(&champion, &report, self.settings.failure_policy);

        let saved = self.catalog.save(&champion).await?;
        tracing::info!(
            champion = %remote_id,
            status = %saved.sync_status,
            downloaded = report.downloaded,
            bytes = report.bytes,
            failed = report.failed_count(),
            "Refreshed assets"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::download::DEFAULT_PUBLIC_PREFIX;
    use crate::http::testing::FakeSession;
    use crate::model::{ChampionClass, Gender, Region};
    use crate::provider::ddragon::DDRAGON_BASE_URL;
    use crate::provider::meraki::MERAKI_URL;
    use crate::provider::LocalDetails;
    use crate::retry::RetryConfig;
    use serde_json::{json, Map, Value};
    use std::path::PathBuf;

    const VERSION: &str = "14.1.1";

    fn dd(path: &str) -> String {
        format!("{DDRAGON_BASE_URL}{path}")
    }

    fn icon_url(id: &str) -> String {
        dd(&format!("/cdn/{VERSION}/img/champion/{id}.png"))
    }

    fn detail_url(id: &str) -> String {
        dd(&format!("/cdn/{VERSION}/data/en_US/champion/{id}.json"))
    }

    fn test_tmp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("champsync")
            .join("sync_tests")
            .join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    /// Serve a full catalog of `ids` at [`VERSION`]: summary, detail,
    /// secondary data and every image.
    fn serve_catalog(fake: &FakeSession, ids: &[(&str, i64)]) {
        fake.json(dd("/api/versions.json"), json!([VERSION, "13.24.1"]));

        let mut data = Map::new();
        let mut meraki = Map::new();
        for (id, key) in ids {
            data.insert(
                id.to_string(),
                json!({"id": id, "key": key.to_string(), "name": id}),
            );
            meraki.insert(
                id.to_string(),
                json!({
                    "attributeRatings": {"gender": "female"},
                    "species": "Vastaya",
                    "biography": {"region": "Ionia"},
                    "releaseDate": "2011-12-14",
                    "positions": ["MIDDLE"]
                }),
            );

            let mut detail = Map::new();
            detail.insert(
                id.to_string(),
                json!({
                    "id": id,
                    "name": id,
                    "lore": "Lore.",
                    "tags": ["Mage"],
                    "partype": "Mana",
                    "stats": {"attackrange": 550.0},
                    "passive": {"name": "P", "image": {"full": format!("{id}_P.png")}},
                    "spells": [{"name": "Q", "description": "d", "cooldownBurn": "7",
                                "image": {"full": format!("{id}Q.png")}}],
                    "skins": [{"name": "default", "num": 0}]
                }),
            );
            fake.json(detail_url(id), json!({"data": Value::Object(detail)}));

            fake.bytes(icon_url(id), b"icon");
            fake.bytes(dd(&format!("/cdn/{VERSION}/img/passive/{id}_P.png")), b"p");
            fake.bytes(dd(&format!("/cdn/{VERSION}/img/spell/{id}Q.png")), b"q");
            fake.bytes(dd(&format!("/cdn/img/champion/splash/{id}_0.jpg")), b"s");
            fake.bytes(dd(&format!("/cdn/img/champion/loading/{id}_0.jpg")), b"l");
        }
        fake.json(
            dd(&format!("/cdn/{VERSION}/data/en_US/champion.json")),
            json!({"data": Value::Object(data)}),
        );
        fake.json(MERAKI_URL, Value::Object(meraki));
    }

    fn engine(
        fake: Arc<FakeSession>,
        store: Arc<SqliteCatalog>,
        assets: PathBuf,
        settings: SyncSettings,
    ) -> SyncEngine {
        let remote = RemoteCatalog::new(fake.clone(), RetryConfig::none(), LocalDetails::empty());
        SyncEngine::new(
            store.clone(),
            store,
            Arc::new(remote),
            AssetFetcher::new(fake, RetryConfig::none()),
            AssetLayout::new(assets, DEFAULT_PUBLIC_PREFIX, "en_US"),
            SyncSettings {
                no_progress_bar: true,
                ..settings
            },
        )
    }

    async fn status_of(store: &SqliteCatalog, name: &str) -> SyncStatus {
        store
            .find_by_name(name)
            .await
            .unwrap()
            .map(|c| c.sync_status)
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_run_reaches_ready() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103), ("Annie", 1)]);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let assets = test_tmp_dir("fresh");
        let engine = engine(fake, store.clone(), assets.clone(), SyncSettings::default());

        let stats = engine.run().await.unwrap();
        assert_eq!(stats.worklist, 2);
        assert_eq!(stats.ready, 2);
        assert_eq!(stats.incomplete, 0);
        assert_eq!(stats.assets_downloaded, 10);

        let ahri = store.find_by_name("ahri").await.unwrap().unwrap();
        assert_eq!(ahri.sync_status, SyncStatus::Ready);
        assert_eq!(ahri.version.as_deref(), Some(VERSION));
        assert_eq!(ahri.remote_id.as_deref(), Some("Ahri"));
        assert_eq!(ahri.gender, Some(Gender::Female));
        assert_eq!(ahri.class, Some(ChampionClass::Mage));
        assert!(ahri.regions.contains(&Region::Ionia));
        assert_eq!(
            ahri.icon_url.as_deref(),
            Some("/data/images/lol/en_US/champions/Ahri/icon/icon.png")
        );
        assert!(assets.join("en_US/champions/Ahri/skins/splash_0.jpg").exists());

        assert_eq!(current_version(store.as_ref()).await.unwrap(), VERSION);
        let run = store.last_completed_run().await.unwrap().unwrap();
        assert_eq!(run.stats, stats);
    }

    #[tokio::test]
    async fn test_second_run_has_empty_worklist() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103)]);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let engine = engine(
            fake.clone(),
            store.clone(),
            test_tmp_dir("second_run"),
            SyncSettings::default(),
        );

        engine.run().await.unwrap();
        let detail_hits = fake.hits(&detail_url("Ahri"));
        let stats = engine.run().await.unwrap();
        assert_eq!(stats.worklist, 0);
        assert_eq!(fake.hits(&detail_url("Ahri")), detail_hits);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_version_failure_persists_nothing() {
        let fake = Arc::new(FakeSession::new());
        fake.status(dd("/api/versions.json"), 503);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let engine = engine(fake, store.clone(), test_tmp_dir("no_version"), SyncSettings::default());

        assert!(engine.run().await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.get_setting(VERSION_KEY).await.unwrap().is_none());
        assert!(store.last_completed_run().await.unwrap().is_none());
        assert_eq!(current_version(store.as_ref()).await.unwrap(), DEFAULT_VERSION);
    }

    #[tokio::test]
    async fn test_detail_failure_is_isolated() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103), ("Annie", 1)]);
        fake.status(detail_url("Annie"), 500);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let engine = engine(fake, store.clone(), test_tmp_dir("detail_fail"), SyncSettings::default());

        let stats = engine.run().await.unwrap();
        assert_eq!(stats.metadata_failed, 1);
        assert_eq!(stats.ready, 1);
        assert_eq!(stats.incomplete, 1);
        assert_eq!(status_of(&store, "Ahri").await, SyncStatus::Ready);
        assert_eq!(status_of(&store, "Annie").await, SyncStatus::Incomplete);
        assert_eq!(current_version(store.as_ref()).await.unwrap(), VERSION);
    }

    #[tokio::test]
    async fn test_detail_failure_keeps_merged_data() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103)]);
        fake.status(detail_url("Ahri"), 500);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let mut champ = crate::completeness::tests::complete_champion("Ahri");
        champ.version = Some("13.24.1".to_string());
        let seeded = store.save(&champ).await.unwrap();

        let engine = engine(fake, store.clone(), test_tmp_dir("detail_keeps"), SyncSettings::default());
        let stats = engine.run().await.unwrap();
        assert_eq!(stats.worklist, 1);
        assert_eq!(stats.metadata_failed, 1);

        let reloaded = store.get(seeded.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded.sync_status, SyncStatus::Incomplete);
        assert_eq!(reloaded.version.as_deref(), Some("13.24.1"));
        assert_eq!(reloaded.description, seeded.description);
        assert_eq!(reloaded.spells, seeded.spells);
        assert_eq!(reloaded.skins, seeded.skins);
        assert_eq!(reloaded.regions, seeded.regions);
        assert_eq!(reloaded.icon_url, seeded.icon_url);
    }

    #[tokio::test]
    async fn test_asset_disk_error_marks_incomplete() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103)]);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        // A regular file where the asset root should be.
        let assets = test_tmp_dir("root_is_file");
        std::fs::create_dir_all(assets.parent().unwrap()).unwrap();
        std::fs::write(&assets, b"not a directory").unwrap();

        let engine = engine(fake, store.clone(), assets.clone(), SyncSettings::default());
        let stats = engine.run().await.unwrap();
        assert_eq!(stats.ready, 0);
        assert_eq!(stats.incomplete, 1);
        assert_eq!(stats.timed_out, 0);
        assert_eq!(stats.assets_downloaded, 0);

        let ahri = store.find_by_name("Ahri").await.unwrap().unwrap();
        assert_eq!(ahri.sync_status, SyncStatus::Incomplete);
        assert_eq!(ahri.version.as_deref(), Some(VERSION));
        assert_eq!(current_version(store.as_ref()).await.unwrap(), VERSION);
        let _ = std::fs::remove_file(&assets);
    }

    /// Catalog whose writes of a READY row for one champion fail.
    struct RejectReady {
        inner: Arc<SqliteCatalog>,
        name: &'static str,
    }

    #[async_trait::async_trait]
    impl CatalogStore for RejectReady {
        async fn get(&self, id: i64) -> Result<Option<Champion>, StoreError> {
            self.inner.get(id).await
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Champion>, StoreError> {
            self.inner.find_by_name(name).await
        }

        async fn list_all(&self) -> Result<Vec<Champion>, StoreError> {
            self.inner.list_all().await
        }

        async fn save(&self, champion: &Champion) -> Result<Champion, StoreError> {
            if champion.name == self.name && champion.sync_status == SyncStatus::Ready {
                return Err(StoreError::Query("disk I/O error".to_string()));
            }
            self.inner.save(champion).await
        }

        async fn count(&self) -> Result<u64, StoreError> {
            self.inner.count().await
        }
    }

    #[tokio::test]
    async fn test_failed_final_write_is_not_a_timeout() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103), ("Zed", 238)]);
        fake.delay(icon_url("Zed"), Duration::from_secs(5));
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let catalog = Arc::new(RejectReady {
            inner: store.clone(),
            name: "Ahri",
        });
        let remote = RemoteCatalog::new(fake.clone(), RetryConfig::none(), LocalDetails::empty());
        let engine = SyncEngine::new(
            catalog,
            store.clone(),
            Arc::new(remote),
            AssetFetcher::new(fake, RetryConfig::none()),
            AssetLayout::new(test_tmp_dir("unsaved"), DEFAULT_PUBLIC_PREFIX, "en_US"),
            SyncSettings {
                asset_timeout: Duration::from_millis(500),
                workers: 2,
                no_progress_bar: true,
                ..SyncSettings::default()
            },
        );

        let stats = engine.run().await.unwrap();
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.ready, 0);
        assert_eq!(stats.incomplete, 2);
        assert_eq!(status_of(&store, "Ahri").await, SyncStatus::Incomplete);
        assert_eq!(status_of(&store, "Zed").await, SyncStatus::Incomplete);
    }

    #[tokio::test]
    async fn test_deadline_marks_stragglers_incomplete() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103), ("Zed", 238)]);
        fake.delay(icon_url("Zed"), Duration::from_secs(5));
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let engine = engine(
            fake,
            store.clone(),
            test_tmp_dir("deadline"),
            SyncSettings {
                asset_timeout: Duration::from_millis(500),
                workers: 2,
                ..SyncSettings::default()
            },
        );

        let stats = engine.run().await.unwrap();
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.ready, 1);
        assert_eq!(status_of(&store, "Ahri").await, SyncStatus::Ready);
        assert_eq!(status_of(&store, "Zed").await, SyncStatus::Incomplete);
        assert_eq!(current_version(store.as_ref()).await.unwrap(), VERSION);
    }

    #[tokio::test]
    async fn test_failure_policy_controls_ready() {
        for (policy, expected) in [
            (AssetFailurePolicy::Continue, SyncStatus::Ready),
            (AssetFailurePolicy::MarkIncomplete, SyncStatus::Incomplete),
        ] {
            let fake = Arc::new(FakeSession::new());
            serve_catalog(&fake, &[("Ahri", 103)]);
            fake.status(dd("/cdn/img/champion/splash/Ahri_0.jpg"), 404);
            let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
            let engine = engine(
                fake,
                store.clone(),
                test_tmp_dir(&format!("policy_{}", expected)),
                SyncSettings {
                    failure_policy: policy,
                    ..SyncSettings::default()
                },
            );
            let stats = engine.run().await.unwrap();
            assert_eq!(stats.assets_failed, 1);
            assert_eq!(status_of(&store, "Ahri").await, expected);
        }
    }

    #[tokio::test]
    async fn test_limit_truncates_worklist() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103), ("Annie", 1), ("Zed", 238)]);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let engine = engine(
            fake,
            store.clone(),
            test_tmp_dir("limit"),
            SyncSettings {
                limit: Some(1),
                ..SyncSettings::default()
            },
        );
        let stats = engine.run().await.unwrap();
        assert_eq!(stats.worklist, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_refresh_unknown_id() {
        let fake = Arc::new(FakeSession::new());
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let engine = engine(fake, store, test_tmp_dir("refresh_404"), SyncSettings::default());
        assert!(engine.refresh(42).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_refresh_downloads_and_promotes() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103)]);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let mut champ = crate::completeness::tests::complete_champion("Ahri");
        champ.remote_id = None;
        champ.icon_url = None;
        champ.sync_status = SyncStatus::Incomplete;
        let saved = store.save(&champ).await.unwrap();

        let assets = test_tmp_dir("refresh_ok");
        let engine = engine(fake, store.clone(), assets.clone(), SyncSettings::default());
        let refreshed = engine.refresh(saved.id.unwrap()).await.unwrap();
        assert_eq!(refreshed.sync_status, SyncStatus::Ready);
        assert_eq!(refreshed.remote_id.as_deref(), Some("Ahri"));
        assert!(refreshed.icon_url.is_some());
        assert!(assets.join("en_US/champions/Ahri/icon/icon.png").exists());
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_row_unchanged() {
        let fake = Arc::new(FakeSession::new());
        serve_catalog(&fake, &[("Ahri", 103)]);
        fake.status(detail_url("Ahri"), 404);
        let store = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let mut champ = crate::completeness::tests::complete_champion("Ahri");
        champ.sync_status = SyncStatus::Incomplete;
        let saved = store.save(&champ).await.unwrap();

        let engine = engine(fake, store.clone(), test_tmp_dir("refresh_fail"), SyncSettings::default());
        assert!(engine.refresh(saved.id.unwrap()).await.is_err());
        let reloaded = store.get(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded, saved);
    }
}
