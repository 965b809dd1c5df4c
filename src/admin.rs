//! Read-only catalog reporting for the admin commands.

use serde::Serialize;

use crate::catalog::{CatalogStore, StoreError, SyncRunRecord, VersionStore};
use crate::completeness;
use crate::model::Champion;
use crate::sync;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total: u64,
    pub complete: u64,
    pub incomplete: u64,
    /// The last sync run that reached completion.
    pub last_run: Option<SyncRunRecord>,
    pub current_version: String,
}

pub async fn catalog_stats(
    catalog: &dyn CatalogStore,
    versions: &dyn VersionStore,
) -> Result<CatalogStats, StoreError> {
    let total = catalog.count().await?;
    let incomplete = catalog.list_incomplete().await?.len() as u64;
    let last_run = versions.last_completed_run().await?;
    Ok(CatalogStats {
        total,
        complete: total.saturating_sub(incomplete),
        incomplete,
        last_run,
        current_version: sync::current_version(versions).await?,
    })
}

/// One row of the incomplete listing.
#[derive(Debug, Clone, Serialize)]
pub struct IncompleteEntry {
    pub id: Option<i64>,
    pub name: String,
    pub status: String,
    pub missing: Vec<&'static str>,
}

impl From<&Champion> for IncompleteEntry {
    fn from(champion: &Champion) -> Self {
        Self {
            id: champion.id,
            name: champion.name.clone(),
            status: champion.sync_status.to_string(),
            missing: completeness::missing_fields(champion),
        }
    }
}

pub async fn incomplete_entries(
    catalog: &dyn CatalogStore,
) -> Result<Vec<IncompleteEntry>, StoreError> {
    Ok(catalog
        .list_incomplete()
        .await?
        .iter()
        .map(IncompleteEntry::from)
        .collect())
}
