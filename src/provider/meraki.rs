//! Meraki Analytics bulk champion dataset.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use super::types::{non_blank, string_or_list, Supplement};
use crate::http::{HttpError, HttpSession};
use crate::retry::{self, RetryAction, RetryConfig};

pub const MERAKI_URL: &str =
    "https://cdn.merakianalytics.com/riot/lol/resources/latest/en-US/champions.json";

pub(crate) const PROVIDER: &str = "meraki";

pub type MerakiIndex = HashMap<String, Supplement>;

pub struct Meraki {
    session: Arc<dyn HttpSession>,
    url: String,
    retry: RetryConfig,
}

impl Meraki {
    pub fn new(session: Arc<dyn HttpSession>, retry: RetryConfig) -> Self {
        Self {
            session,
            url: MERAKI_URL.to_string(),
            retry,
        }
    }

    /// Fetch the whole dataset once. Unavailability is logged and reported as
    /// absent; callers fall back to sentinel values.
    pub async fn load(&self) -> Option<MerakiIndex> {
        let result = retry::retry_with_backoff(
            &self.retry,
            PROVIDER,
            |e: &HttpError| RetryAction::from_retryable(e.is_retryable()),
            || self.session.get_json(&self.url),
        )
        .await;

        match result {
            Ok(body) => {
                let index = parse_index(&body);
                tracing::debug!(provider = PROVIDER, entries = index.len(), "Loaded dataset");
                Some(index)
            }
            Err(e) => {
                tracing::warn!(
                    provider = PROVIDER,
                    error = %e,
                    "Secondary source unavailable, gender/species/region will use defaults"
                );
                None
            }
        }
    }
}

fn parse_index(body: &Value) -> MerakiIndex {
    body.as_object()
        .map(|entries| {
            entries
                .iter()
                .map(|(id, record)| (id.clone(), parse_record(record)))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_record(record: &Value) -> Supplement {
    let mut s = Supplement::new(PROVIDER);
    s.gender = non_blank(record.pointer("/attributeRatings/gender"))
        .or_else(|| non_blank(record.get("gender")));
    s.species = string_or_list(record.get("species"));
    s.regions = string_or_list(record.pointer("/biography/region"));
    if s.regions.is_empty() {
        s.regions = string_or_list(record.get("faction"));
    }
    s.release_date = non_blank(record.get("releaseDate"))
        .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok());
    s.resource = non_blank(record.get("resource"));
    s.positions = string_or_list(record.get("positions"));
    s.attack_type = non_blank(record.get("attackType"));
    s
}
