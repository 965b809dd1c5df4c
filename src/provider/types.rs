use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

/// One entry of the remote catalog summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    /// Canonical provider id, e.g. `MonkeyKing`.
    pub id: String,
    /// Numeric id used by the community mirror.
    pub key: i64,
    pub name: String,
}

/// Remote catalog keyed by canonical id, in stable id order.
pub type RemoteSummary = BTreeMap<String, SummaryEntry>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub full: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailStats {
    #[serde(default)]
    pub attackrange: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailPassive {
    #[serde(default)]
    pub image: ImageRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailSpell {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cooldown_burn: String,
    #[serde(default)]
    pub image: ImageRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailSkin {
    #[serde(default)]
    pub name: String,
    pub num: u32,
}

/// Authoritative per-champion record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChampionDetail {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lore: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Resource bar label (`Mana`, `Energy`, `Blood Well`, ...).
    #[serde(default)]
    pub partype: Option<String>,
    #[serde(default)]
    pub stats: DetailStats,
    #[serde(default)]
    pub passive: Option<DetailPassive>,
    #[serde(default)]
    pub spells: Vec<DetailSpell>,
    #[serde(default)]
    pub skins: Vec<DetailSkin>,
}

/// Secondary metadata for one champion. Every field is optional; the
/// mapper walks a list of these in precedence order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Supplement {
    pub provider: &'static str,
    pub short_bio: Option<String>,
    pub roles: Vec<String>,
    pub attack_type: Option<String>,
    pub gender: Option<String>,
    pub species: Vec<String>,
    pub regions: Vec<String>,
    pub release_date: Option<NaiveDate>,
    pub resource: Option<String>,
    pub positions: Vec<String>,
}

impl Supplement {
    pub fn new(provider: &'static str) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }
}

/// Read a field that providers publish either as a string or as a list of
/// strings. Blank entries are dropped.
pub(crate) fn string_or_list(value: Option<&Value>) -> Vec<String> {
    let push = |out: &mut Vec<String>, s: &str| {
        let s = s.trim();
        if !s.is_empty() {
            out.push(s.to_string());
        }
    };
    let mut out = Vec::new();
    match value {
        Some(Value::String(s)) => push(&mut out, s),
        Some(Value::Array(items)) => {
            for item in items {
                if let Some(s) = item.as_str() {
                    push(&mut out, s);
                }
            }
        }
        _ => {}
    }
    out
}

/// Non-blank string at `value`, if any.
pub(crate) fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
