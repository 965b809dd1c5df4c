//! Optional bundled `championsDetail.json`, consulted like any other
//! secondary source.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;

use super::types::{non_blank, string_or_list, Supplement};

pub(crate) const PROVIDER: &str = "local";

/// Lookup key for a champion id: `'`, spaces and `.` removed, lower-cased.
pub fn normalize_key(id: &str) -> String {
    id.chars()
        .filter(|c| !matches!(c, '\'' | ' ' | '.'))
        .collect::<String>()
        .to_lowercase()
}

#[derive(Debug, Default)]
pub struct LocalDetails {
    entries: HashMap<String, Supplement>,
}

impl LocalDetails {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the file at `path`. A missing or unreadable file yields an empty
    /// table.
    pub async fn load(path: &Path) -> Self {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Local detail file not loaded");
                return Self::empty();
            }
        };
        match Self::from_json(&text) {
            Ok(details) => {
                tracing::debug!(path = %path.display(), entries = details.len(), "Loaded local details");
                details
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Local detail file is not valid JSON");
                Self::empty()
            }
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let root: Value = serde_json::from_str(text)?;
        let mut entries = HashMap::new();
        let champions = root
            .get("champions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for node in &champions {
            let Some(id) = node.get("id").and_then(Value::as_str) else {
                continue;
            };
            let key = normalize_key(id);
            let supplement = parse_entry(node);
            if key == "wukong" {
                entries.insert("monkeyking".to_string(), supplement.clone());
            }
            entries.insert(key, supplement);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&Supplement> {
        self.entries.get(&normalize_key(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_entry(node: &Value) -> Supplement {
    let mut s = Supplement::new(PROVIDER);
    s.gender = non_blank(node.get("gender"));
    s.positions = string_or_list(node.get("positions"));
    s.species = string_or_list(node.get("species"));
    s.regions = string_or_list(node.get("region"));
    s.resource = non_blank(node.get("resource"));
    s.attack_type = non_blank(node.get("rangeType"));
    s.release_date = node
        .get("releaseYear")
        .and_then(|y| y.as_i64().or_else(|| y.as_str().and_then(|s| s.parse().ok())))
        .and_then(|year| NaiveDate::from_ymd_opt(year as i32, 1, 1));
    s
}
