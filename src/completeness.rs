//! The one definition of "complete" used by both the incomplete-entities
//! listing and the READY decision at the end of an asset stage.

use crate::model::Champion;

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Names of required fields that are missing or empty on `champion`.
pub fn missing_fields(champion: &Champion) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if champion.name.trim().is_empty() {
        missing.push("name");
    }
    if blank(&champion.description) {
        missing.push("description");
    }
    if blank(&champion.icon_url) {
        missing.push("icon_url");
    }
    if champion.release_date.is_none() {
        missing.push("release_date");
    }
    if champion.gender.is_none() {
        missing.push("gender");
    }
    if champion.class.is_none() {
        missing.push("class");
    }
    if champion.positions.is_empty() {
        missing.push("positions");
    }
    if champion.species.is_empty() {
        missing.push("species");
    }
    if champion.regions.is_empty() {
        missing.push("regions");
    }
    if champion.resource.is_none() {
        missing.push("resource");
    }
    if champion.attack_range.is_none() {
        missing.push("attack_range");
    }
    if blank(&champion.passive_icon_url) {
        missing.push("passive_icon_url");
    }
    if champion.spells.is_empty() {
        missing.push("spells");
    }
    if champion.skins.is_empty() {
        missing.push("skins");
    }
    missing
}

pub fn is_complete(champion: &Champion) -> bool {
    missing_fields(champion).is_empty()
}
