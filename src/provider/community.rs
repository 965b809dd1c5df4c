//! CommunityDragon game-data mirror, keyed by numeric champion id.

use std::sync::Arc;

use serde_json::Value;

use super::types::{non_blank, string_or_list, Supplement};
use crate::http::{HttpError, HttpSession};
use crate::retry::{self, RetryAction, RetryConfig};

pub const COMMUNITY_BASE_URL: &str =
    "https://raw.communitydragon.org/latest/plugins/rcp-be-lol-game-data/global/default/v1/champions";

pub(crate) const PROVIDER: &str = "communitydragon";

pub struct CommunityDragon {
    session: Arc<dyn HttpSession>,
    base_url: String,
    retry: RetryConfig,
}

impl CommunityDragon {
    pub fn new(session: Arc<dyn HttpSession>, retry: RetryConfig) -> Self {
        Self {
            session,
            base_url: COMMUNITY_BASE_URL.to_string(),
            retry,
        }
    }

    pub fn record_url(&self, key: i64) -> String {
        format!("{}/{}.json", self.base_url, key)
    }

    /// Short bio, roles and attack type for one champion.
    pub async fn supplement(&self, key: i64) -> Result<Supplement, HttpError> {
        let url = self.record_url(key);
        let body = retry::retry_with_backoff(
            &self.retry,
            PROVIDER,
            |e: &HttpError| RetryAction::from_retryable(e.is_retryable()),
            || self.session.get_json(&url),
        )
        .await?;
        Ok(parse_record(&body))
    }
}

fn parse_record(body: &Value) -> Supplement {
    let mut supplement = Supplement::new(PROVIDER);
    supplement.short_bio = non_blank(body.get("shortBio"));
    supplement.roles = string_or_list(body.get("roles"));
    supplement.attack_type = non_blank(body.pointer("/tacticalInfo/attackType"));
    supplement
}
