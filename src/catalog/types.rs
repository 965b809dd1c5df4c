//! Types for sync run bookkeeping.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Statistics for a single sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncRunStats {
    /// Remote version tag the run synced against.
    pub remote_version: String,
    /// Number of champions on the worklist.
    pub worklist: u64,
    /// Champions whose metadata stage failed.
    pub metadata_failed: u64,
    /// Champions that ended the run READY.
    pub ready: u64,
    /// Champions that ended the run INCOMPLETE.
    pub incomplete: u64,
    /// Asset stages abandoned at the run deadline.
    pub timed_out: u64,
    /// Individual files fetched from the network.
    pub assets_downloaded: u64,
    /// Individual files that failed to download.
    pub assets_failed: u64,
}

/// A recorded sync run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncRunRecord {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub stats: SyncRunStats,
}
