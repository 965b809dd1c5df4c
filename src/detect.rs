//! Worklist computation: which remote champions need a sync.

use std::collections::HashMap;

use crate::model::{Champion, SyncStatus};
use crate::provider::RemoteSummary;

/// Remote ids that need syncing, in summary order.
///
/// Remote and local are joined by display name, case-insensitively. An id is
/// included when no local champion has its name, when the local copy was
/// last synced against a different version, or when it isn't `READY`.
pub fn compute_worklist(
    summary: &RemoteSummary,
    local: &[Champion],
    remote_version: &str,
) -> Vec<String> {
    let by_name: HashMap<String, &Champion> = local
        .iter()
        .map(|c| (c.name.to_lowercase(), c))
        .collect();

    summary
        .values()
        .filter(|entry| match by_name.get(&entry.name.to_lowercase()) {
            None => true,
            Some(existing) => {
                existing.version.as_deref() != Some(remote_version)
                    || existing.sync_status != SyncStatus::Ready
            }
        })
        .map(|entry| entry.id.clone())
        .collect()
}
