//! Data Dragon: the authoritative source for versions, the catalog summary,
//! per-champion detail and every image URL.

use std::sync::Arc;

use serde_json::Value;

use super::error::ProviderError;
use super::types::{ChampionDetail, RemoteSummary, SummaryEntry};
use crate::http::{HttpError, HttpSession};
use crate::retry::{self, RetryAction, RetryConfig};

pub const DDRAGON_BASE_URL: &str = "https://ddragon.leagueoflegends.com";

const PROVIDER: &str = "ddragon";

pub struct DataDragon {
    session: Arc<dyn HttpSession>,
    base_url: String,
    retry: RetryConfig,
}

impl DataDragon {
    pub fn new(session: Arc<dyn HttpSession>, retry: RetryConfig) -> Self {
        Self {
            session,
            base_url: DDRAGON_BASE_URL.to_string(),
            retry,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch(&self, url: &str) -> Result<Value, ProviderError> {
        retry::retry_with_backoff(
            &self.retry,
            PROVIDER,
            |e: &HttpError| RetryAction::from_retryable(e.is_retryable()),
            || self.session.get_json(url),
        )
        .await
        .map_err(ProviderError::from)
    }

    /// Latest published version tag (first entry of `versions.json`).
    pub async fn latest_version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/versions.json", self.base_url);
        let versions = self.fetch(&url).await?;
        versions
            .as_array()
            .and_then(|v| v.first())
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::payload(PROVIDER, "versions.json has no entries"))
    }

    /// Catalog summary for one locale: canonical id to numeric key and name.
    pub async fn summary(
        &self,
        version: &str,
        locale: &str,
    ) -> Result<RemoteSummary, ProviderError> {
        let url = format!(
            "{}/cdn/{}/data/{}/champion.json",
            self.base_url, version, locale
        );
        let body = self.fetch(&url).await?;
        let data = body
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| ProviderError::payload(PROVIDER, "champion.json has no data map"))?;

        let mut summary = RemoteSummary::new();
        for (id, entry) in data {
            let name = entry.get("name").and_then(Value::as_str);
            let key = entry
                .get("key")
                .and_then(|k| k.as_str().and_then(|s| s.parse().ok()).or(k.as_i64()));
            match (name, key) {
                (Some(name), Some(key)) => {
                    summary.insert(
                        id.clone(),
                        SummaryEntry {
                            id: id.clone(),
                            key,
                            name: name.to_string(),
                        },
                    );
                }
                _ => tracing::warn!(id = %id, "Summary entry missing name or key, skipping"),
            }
        }
        Ok(summary)
    }

    /// Authoritative detail for one champion.
    pub async fn detail(
        &self,
        version: &str,
        locale: &str,
        id: &str,
    ) -> Result<ChampionDetail, ProviderError> {
        let url = format!(
            "{}/cdn/{}/data/{}/champion/{}.json",
            self.base_url, version, locale, id
        );
        let body = match self.fetch(&url).await {
            Err(ProviderError::Http(e)) if e.status() == Some(404) => {
                return Err(ProviderError::UnknownId(id.to_string()));
            }
            other => other?,
        };
        let record = body
            .get("data")
            .and_then(|d| d.get(id))
            .cloned()
            .ok_or_else(|| ProviderError::UnknownId(id.to_string()))?;
        serde_json::from_value(record)
            .map_err(|e| ProviderError::payload(PROVIDER, format!("detail for {id}: {e}")))
    }

    pub fn champion_icon_url(&self, version: &str, id: &str) -> String {
        format!("{}/cdn/{}/img/champion/{}.png", self.base_url, version, id)
    }

    pub fn passive_icon_url(&self, version: &str, file: &str) -> String {
        format!("{}/cdn/{}/img/passive/{}", self.base_url, version, file)
    }

    pub fn spell_icon_url(&self, version: &str, file: &str) -> String {
        format!("{}/cdn/{}/img/spell/{}", self.base_url, version, file)
    }

    /// Splash and loading art are not versioned.
    pub fn splash_url(&self, id: &str, num: u32) -> String {
        format!("{}/cdn/img/champion/splash/{}_{}.jpg", self.base_url, id, num)
    }

    pub fn loading_url(&self, id: &str, num: u32) -> String {
        format!("{}/cdn/img/champion/loading/{}_{}.jpg", self.base_url, id, num)
    }
}
