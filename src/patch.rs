//! Manual corrections. Unlike the automated merge, every supplied field
//! overwrites what is stored.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogStore, StoreError};
use crate::model::{AttackRange, Champion, ChampionClass, Gender, Region, Resource};

/// Partial update; `None` means "leave as is".
///
/// The automated merge only fills gender, species and regions while they
/// hold their unset sentinel (`UNKNOWN`, `Unknown`), so a patch that writes
/// the sentinel is overwritten by the next sync. The CLI refuses those values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChampionPatch {
    pub description: Option<String>,
    pub gender: Option<Gender>,
    pub class: Option<ChampionClass>,
    pub positions: Option<BTreeSet<String>>,
    pub species: Option<BTreeSet<String>>,
    pub regions: Option<BTreeSet<Region>>,
    pub resource: Option<Resource>,
    pub attack_range: Option<AttackRange>,
    pub release_date: Option<NaiveDate>,
}

impl ChampionPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, champion: &mut Champion) {
        if let Some(description) = &self.description {
            champion.description = Some(description.clone());
        }
        if let Some(gender) = self.gender {
            champion.gender = Some(gender);
        }
        if let Some(class) = self.class {
            champion.class = Some(class);
        }
        if let Some(positions) = &self.positions {
            champion.positions = positions.clone();
        }
        if let Some(species) = &self.species {
            champion.species = species.clone();
        }
        if let Some(regions) = &self.regions {
            champion.regions = regions.clone();
        }
        if let Some(resource) = self.resource {
            champion.resource = Some(resource);
        }
        if let Some(attack_range) = self.attack_range {
            champion.attack_range = Some(attack_range);
        }
        if let Some(release_date) = self.release_date {
            champion.release_date = Some(release_date);
        }
    }
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Champion {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PatchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PatchError::NotFound(_))
    }
}

/// Apply `patch` to champion `id` and persist it. Nothing is written when
/// the id is unknown.
pub async fn apply_patch(
    store: &dyn CatalogStore,
    id: i64,
    patch: &ChampionPatch,
) -> Result<Champion, PatchError> {
    let mut champion = store.get(id).await?.ok_or(PatchError::NotFound(id))?;
    patch.apply_to(&mut champion);
    let saved = store.save(&champion).await?;
    tracing::info!(id, name = %saved.name, "Applied manual patch");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::completeness::tests::complete_champion;
    use crate::mapper;
    use crate::provider::ChampionDetail;

    #[tokio::test]
    async fn test_patch_overwrites_set_field() {
        let store = SqliteCatalog::open_in_memory().unwrap();
        let saved = store.save(&complete_champion("Ahri")).await.unwrap();
        assert_eq!(saved.gender, Some(Gender::Female));

        let patch = ChampionPatch {
            gender: Some(Gender::Other),
            regions: Some(BTreeSet::from([Region::Noxus, Region::Ionia])),
            ..ChampionPatch::default()
        };
        let patched = apply_patch(&store, saved.id.unwrap(), &patch).await.unwrap();
        assert_eq!(patched.gender, Some(Gender::Other));
        assert_eq!(patched.regions.len(), 2);

        let reloaded = store.get(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded, patched);
    }

    #[test]
    fn test_merge_would_have_skipped_the_same_field() {
        let mut champ = complete_champion("Ahri");
        champ.description = Some("Old".into());
        let detail = ChampionDetail {
            id: "Ahri".into(),
            lore: Some("New".into()),
            ..ChampionDetail::default()
        };
        mapper::merge(&mut champ, &detail, &[], "/x");
        assert_eq!(champ.description.as_deref(), Some("Old"));

        let patch = ChampionPatch {
            description: Some("New".into()),
            ..ChampionPatch::default()
        };
        patch.apply_to(&mut champ);
        assert_eq!(champ.description.as_deref(), Some("New"));
    }

    #[test]
    fn test_absent_fields_untouched() {
        let mut champ = complete_champion("Ahri");
        let before = champ.clone();
        ChampionPatch::default().apply_to(&mut champ);
        assert_eq!(champ, before);
        assert!(ChampionPatch::default().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = SqliteCatalog::open_in_memory().unwrap();
        let err = apply_patch(&store, 404, &ChampionPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn test_patch_deserializes_partial_json() {
        let patch: ChampionPatch =
            serde_json::from_str(r#"{"gender": "FEMALE", "regions": ["SHADOW_ISLES"]}"#).unwrap();
        assert_eq!(patch.gender, Some(Gender::Female));
        assert_eq!(patch.regions, Some(BTreeSet::from([Region::ShadowIsles])));
        assert!(patch.class.is_none());
    }
}
