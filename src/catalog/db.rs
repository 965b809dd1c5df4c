//! Catalog store traits and SQLite implementation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::error::StoreError;
use super::schema;
use super::types::{SyncRunRecord, SyncRunStats};
use crate::completeness;
use crate::model::{
    AttackRange, CatalogEnum, Champion, ChampionClass, Gender, Resource, SyncStatus,
};

/// Keyed entity store for champions.
///
/// Each champion row is only ever written by the task that owns that
/// champion during a run, so single-row atomicity is all callers rely on.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch a champion by its stable id.
    async fn get(&self, id: i64) -> Result<Option<Champion>, StoreError>;

    /// Fetch a champion by display name, ignoring case.
    async fn find_by_name(&self, name: &str) -> Result<Option<Champion>, StoreError>;

    /// Load the whole catalog.
    async fn list_all(&self) -> Result<Vec<Champion>, StoreError>;

    /// Insert (when `id` is `None`) or update a champion, returning the
    /// stored row with its id populated.
    async fn save(&self, champion: &Champion) -> Result<Champion, StoreError>;

    /// Number of champions in the catalog.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Every champion that fails the completeness predicate. Evaluated live
    /// on each call.
    async fn list_incomplete(&self) -> Result<Vec<Champion>, StoreError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|c| !completeness::is_complete(c))
            .collect())
    }
}

/// Singleton key/value settings plus sync run history.
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Start a new sync run and return its id.
    async fn start_sync_run(&self) -> Result<i64, StoreError>;

    /// Complete a sync run with statistics.
    async fn complete_sync_run(&self, run_id: i64, stats: &SyncRunStats)
        -> Result<(), StoreError>;

    /// The most recent run that reached completion, if any.
    async fn last_completed_run(&self) -> Result<Option<SyncRunRecord>, StoreError>;
}

const CHAMPION_COLUMNS: &str = "id, remote_id, name, description, icon_url, release_date, \
     gender, class, positions, species, resource, attack_range, regions, passive_icon_url, \
     spells, skins, version, sync_status";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite implementation of the catalog and version stores.
pub struct SqliteCatalog {
    /// Wrapped in Mutex because rusqlite::Connection is not Sync.
    conn: Mutex<Connection>,
    /// Path to the database file (for error messages).
    path: PathBuf,
}

impl std::fmt::Debug for SqliteCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCatalog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteCatalog {
    /// Open or create a database at the given path.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let path = path.to_path_buf();
        let path_clone = path.clone();

        let conn = tokio::task::spawn_blocking(move || {
            if let Some(parent) = path_clone.parent() {
                if !parent.as_os_str().is_empty() {
                    let _ = std::fs::create_dir_all(parent);
                }
            }
            let conn = Connection::open(&path_clone).map_err(|e| StoreError::Open {
                path: path_clone.clone(),
                source: e,
            })?;

            conn.pragma_update(None, "journal_mode", "WAL")
                .map_err(StoreError::Migration)?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .map_err(StoreError::Migration)?;

            schema::migrate(&conn)?;

            Ok::<_, StoreError>(conn)
        })
        .await??;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source: e,
        })?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    fn query_champions(
        &self,
        filter: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Champion>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CHAMPION_COLUMNS} FROM champions {filter} ORDER BY id"
            ))
            .map_err(StoreError::query)?;

        let champions = stmt
            .query_map(params, row_to_champion)
            .map_err(StoreError::query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)?;

        Ok(champions)
    }
}

/// JSON-encoded collection columns for one champion.
struct EncodedCollections {
    positions: String,
    species: String,
    regions: String,
    spells: String,
    skins: String,
}

impl EncodedCollections {
    fn new(champion: &Champion) -> Result<Self, StoreError> {
        fn encode<T: serde::Serialize>(
            column: &'static str,
            value: &T,
        ) -> Result<String, StoreError> {
            serde_json::to_string(value).map_err(|source| StoreError::Encode { column, source })
        }

        Ok(Self {
            positions: encode("positions", &champion.positions)?,
            species: encode("species", &champion.species)?,
            regions: encode("regions", &champion.regions)?,
            spells: encode("spells", &champion.spells)?,
            skins: encode("skins", &champion.skins)?,
        })
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn get(&self, id: i64) -> Result<Option<Champion>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {CHAMPION_COLUMNS} FROM champions WHERE id = ?1"),
            [id],
            row_to_champion,
        )
        .optional()
        .map_err(StoreError::query)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Champion>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {CHAMPION_COLUMNS} FROM champions WHERE name = ?1 COLLATE NOCASE"),
            [name],
            row_to_champion,
        )
        .optional()
        .map_err(StoreError::query)
    }

    async fn list_all(&self) -> Result<Vec<Champion>, StoreError> {
        self.query_champions("", &[])
    }

    async fn save(&self, champion: &Champion) -> Result<Champion, StoreError> {
        let encoded = EncodedCollections::new(champion)?;
        let updated_at = Utc::now().timestamp();
        let release_date = champion
            .release_date
            .map(|d| d.format(DATE_FORMAT).to_string());

        let conn = self.lock()?;

        match champion.id {
            None => {
                conn.execute(
                    r#"
                    INSERT INTO champions (remote_id, name, description, icon_url, release_date,
                        gender, class, positions, species, resource, attack_range, regions,
                        passive_icon_url, spells, skins, version, sync_status, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                    "#,
                    rusqlite::params![
                        champion.remote_id,
                        champion.name,
                        champion.description,
                        champion.icon_url,
                        release_date,
                        champion.gender.map(|g| g.as_str()),
                        champion.class.map(|c| c.as_str()),
                        encoded.positions,
                        encoded.species,
                        champion.resource.map(|r| r.as_str()),
                        champion.attack_range.map(|a| a.as_str()),
                        encoded.regions,
                        champion.passive_icon_url,
                        encoded.spells,
                        encoded.skins,
                        champion.version,
                        champion.sync_status.as_str(),
                        updated_at,
                    ],
                )
                .map_err(StoreError::query)?;

                let mut saved = champion.clone();
                saved.id = Some(conn.last_insert_rowid());
                Ok(saved)
            }
            Some(id) => {
                let rows = conn
                    .execute(
                        r#"
                        UPDATE champions SET remote_id = ?1, name = ?2, description = ?3,
                            icon_url = ?4, release_date = ?5, gender = ?6, class = ?7,
                            positions = ?8, species = ?9, resource = ?10, attack_range = ?11,
                            regions = ?12, passive_icon_url = ?13, spells = ?14, skins = ?15,
                            version = ?16, sync_status = ?17, updated_at = ?18
                        WHERE id = ?19
                        "#,
                        rusqlite::params![
                            champion.remote_id,
                            champion.name,
                            champion.description,
                            champion.icon_url,
                            release_date,
                            champion.gender.map(|g| g.as_str()),
                            champion.class.map(|c| c.as_str()),
                            encoded.positions,
                            encoded.species,
                            champion.resource.map(|r| r.as_str()),
                            champion.attack_range.map(|a| a.as_str()),
                            encoded.regions,
                            champion.passive_icon_url,
                            encoded.spells,
                            encoded.skins,
                            champion.version,
                            champion.sync_status.as_str(),
                            updated_at,
                            id,
                        ],
                    )
                    .map_err(StoreError::query)?;

                if rows == 0 {
                    return Err(StoreError::MissingRow(id));
                }
                Ok(champion.clone())
            }
        }
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM champions", [], |row| row.get(0))
            .map_err(StoreError::query)?;
        Ok(count as u64)
    }
}

#[async_trait]
impl VersionStore for SqliteCatalog {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(StoreError::query)
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let updated_at = Utc::now().timestamp();
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            rusqlite::params![key, value, updated_at],
        )
        .map_err(StoreError::query)?;
        Ok(())
    }

    async fn start_sync_run(&self) -> Result<i64, StoreError> {
        let started_at = Utc::now().timestamp();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sync_runs (started_at) VALUES (?1)",
            [started_at],
        )
        .map_err(StoreError::query)?;
        Ok(conn.last_insert_rowid())
    }

    async fn complete_sync_run(
        &self,
        run_id: i64,
        stats: &SyncRunStats,
    ) -> Result<(), StoreError> {
        let completed_at = Utc::now().timestamp();
        let conn = self.lock()?;
        conn.execute(
            r#"
            UPDATE sync_runs SET completed_at = ?1, remote_version = ?2, worklist = ?3,
                metadata_failed = ?4, ready = ?5, incomplete = ?6, timed_out = ?7,
                assets_downloaded = ?8, assets_failed = ?9
            WHERE id = ?10
            "#,
            rusqlite::params![
                completed_at,
                stats.remote_version,
                stats.worklist as i64,
                stats.metadata_failed as i64,
                stats.ready as i64,
                stats.incomplete as i64,
                stats.timed_out as i64,
                stats.assets_downloaded as i64,
                stats.assets_failed as i64,
                run_id,
            ],
        )
        .map_err(StoreError::query)?;
        Ok(())
    }

    async fn last_completed_run(&self) -> Result<Option<SyncRunRecord>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            r#"
            SELECT id, started_at, completed_at, remote_version, worklist, metadata_failed,
                ready, incomplete, timed_out, assets_downloaded, assets_failed
            FROM sync_runs WHERE completed_at IS NOT NULL ORDER BY id DESC LIMIT 1
            "#,
            [],
            |row| {
                let started_at: i64 = row.get(1)?;
                let completed_at: Option<i64> = row.get(2)?;
                Ok(SyncRunRecord {
                    id: row.get(0)?,
                    started_at: Utc
                        .timestamp_opt(started_at, 0)
                        .single()
                        .unwrap_or(chrono::DateTime::UNIX_EPOCH),
                    completed_at: completed_at.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
                    stats: SyncRunStats {
                        remote_version: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        worklist: row.get::<_, i64>(4)? as u64,
                        metadata_failed: row.get::<_, i64>(5)? as u64,
                        ready: row.get::<_, i64>(6)? as u64,
                        incomplete: row.get::<_, i64>(7)? as u64,
                        timed_out: row.get::<_, i64>(8)? as u64,
                        assets_downloaded: row.get::<_, i64>(9)? as u64,
                        assets_failed: row.get::<_, i64>(10)? as u64,
                    },
                })
            },
        )
        .optional()
        .map_err(StoreError::query)
    }
}

fn decode_json<T: serde::de::DeserializeOwned + Default>(text: Option<String>) -> T {
    text.and_then(|t| serde_json::from_str(&t).ok())
        .unwrap_or_default()
}

fn decode_enum<E: CatalogEnum>(text: Option<String>) -> Option<E> {
    text.as_deref().and_then(E::from_normalized)
}

/// Convert a database row to a Champion.
fn row_to_champion(row: &rusqlite::Row<'_>) -> rusqlite::Result<Champion> {
    let release_date: Option<String> = row.get(5)?;
    let status: String = row.get(17)?;

    Ok(Champion {
        id: Some(row.get(0)?),
        remote_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        icon_url: row.get(4)?,
        release_date: release_date
            .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
        gender: decode_enum::<Gender>(row.get(6)?),
        class: decode_enum::<ChampionClass>(row.get(7)?),
        positions: decode_json(row.get(8)?),
        species: decode_json(row.get(9)?),
        resource: decode_enum::<Resource>(row.get(10)?),
        attack_range: decode_enum::<AttackRange>(row.get(11)?),
        regions: decode_json(row.get(12)?),
        passive_icon_url: row.get(13)?,
        spells: decode_json(row.get(14)?),
        skins: decode_json(row.get(15)?),
        version: row.get(16)?,
        sync_status: SyncStatus::from_str(&status).unwrap_or(SyncStatus::Incomplete),
    })
}
