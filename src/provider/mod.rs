//! Remote data sources. Data Dragon is authoritative; the rest are
//! secondary and never fail a run.

pub mod community;
pub mod ddragon;
pub mod error;
pub mod local;
pub mod meraki;
pub mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use community::CommunityDragon;
pub use ddragon::DataDragon;
pub use error::ProviderError;
pub use local::LocalDetails;
pub use meraki::{Meraki, MerakiIndex};
pub use types::{ChampionDetail, RemoteSummary, SummaryEntry, Supplement};

use crate::http::HttpSession;
use crate::retry::RetryConfig;

/// Secondary data that is fetched once per run and shared read-only by the
/// sequential metadata stage.
#[derive(Debug, Default)]
pub struct RunLookups {
    pub meraki: Option<MerakiIndex>,
    /// Set after CommunityDragon fails to answer at all; the rest of the run
    /// skips it instead of paying the timeout for every champion.
    community_down: AtomicBool,
}

/// All provider clients behind one handle.
pub struct RemoteCatalog {
    pub ddragon: DataDragon,
    community: CommunityDragon,
    meraki: Meraki,
    local: LocalDetails,
}

impl RemoteCatalog {
    pub fn new(session: Arc<dyn HttpSession>, retry: RetryConfig, local: LocalDetails) -> Self {
        Self {
            ddragon: DataDragon::new(session.clone(), retry),
            community: CommunityDragon::new(session.clone(), retry),
            meraki: Meraki::new(session, retry),
            local,
        }
    }

    pub async fn prepare_run(&self) -> RunLookups {
        RunLookups {
            meraki: self.meraki.load().await,
            community_down: AtomicBool::new(false),
        }
    }

    /// Secondary records for one champion in precedence order:
    /// CommunityDragon, then Meraki, then the local file. Absent sources are
    /// simply missing from the list.
    pub async fn supplements(&self, lookups: &RunLookups, entry: &SummaryEntry) -> Vec<Supplement> {
        let mut out = Vec::with_capacity(3);
        if !lookups.community_down.load(Ordering::Relaxed) {
            match self.community.supplement(entry.key).await {
                Ok(s) => out.push(s),
                Err(e) if e.is_transport() => {
                    tracing::warn!(
                        provider = community::PROVIDER,
                        error = %e,
                        "Secondary source unreachable, skipping it for the rest of the run"
                    );
                    lookups.community_down.store(true, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = community::PROVIDER,
                        key = entry.key,
                        error = %e,
                        "Secondary source unavailable"
                    );
                }
            }
        }
        if let Some(s) = lookups.meraki.as_ref().and_then(|m| m.get(&entry.id)) {
            out.push(s.clone());
        }
        if let Some(s) = self.local.get(&entry.id) {
            out.push(s.clone());
        }
        out
    }
}
