use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{AttackRange, ChampionClass, Gender, Region, Resource, SyncStatus};

/// Placeholder species written when no secondary source knows better.
pub const UNKNOWN_SPECIES: &str = "Unknown";

/// A champion in the local catalog.
///
/// `id` is assigned by the store on first insert and never changes. The
/// provider-side identity is the display name (case-insensitive), with
/// `remote_id` remembered for asset paths once known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub id: Option<i64>,
    /// Canonical provider id, e.g. `MonkeyKing` for Wukong.
    pub remote_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub class: Option<ChampionClass>,
    pub positions: BTreeSet<String>,
    pub species: BTreeSet<String>,
    pub resource: Option<Resource>,
    pub attack_range: Option<AttackRange>,
    pub regions: BTreeSet<Region>,
    pub passive_icon_url: Option<String>,
    /// Provider order; position carries the Q/W/E/R slot.
    pub spells: Vec<Spell>,
    /// Provider order; `num == 0` is the default skin.
    pub skins: Vec<Skin>,
    /// Remote version tag of the last successful metadata sync.
    pub version: Option<String>,
    pub sync_status: SyncStatus,
}

impl Champion {
    /// A freshly discovered champion that exists only by name.
    pub fn detected(name: impl Into<String>) -> Self {
        Self {
            id: None,
            remote_id: None,
            name: name.into(),
            description: None,
            icon_url: None,
            release_date: None,
            gender: None,
            class: None,
            positions: BTreeSet::new(),
            species: BTreeSet::new(),
            resource: None,
            attack_range: None,
            regions: BTreeSet::new(),
            passive_icon_url: None,
            spells: Vec::new(),
            skins: Vec::new(),
            version: None,
            sync_status: SyncStatus::Detected,
        }
    }

    /// Id used against the providers: the recorded `remote_id`, or one
    /// derived from the display name for rows that predate it.
    pub fn provider_id(&self) -> String {
        if let Some(id) = &self.remote_id {
            return id.clone();
        }
        if self.name.eq_ignore_ascii_case("wukong") {
            return "MonkeyKing".to_string();
        }
        self.name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }
}

/// One ability; `cooldown` stays free text because providers mix
/// per-rank lists, single values and prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub description: String,
    pub cooldown: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    pub name: String,
    pub num: u32,
    pub splash_url: String,
    pub loading_url: String,
}
