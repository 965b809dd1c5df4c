//! Field merging from provider payloads into a [`Champion`].
//!
//! Each field is a short-circuit chain over the secondary records (already
//! in precedence order) followed by the authoritative record or a computed
//! value. The automated path only fills fields that are unset; sentinel
//! values written when the secondaries were down count as unset so a later
//! run can replace them.

use std::collections::BTreeSet;

use crate::download::paths::sanitize_component;
use crate::model::{
    normalize, resolve, AttackRange, Champion, ChampionClass, Gender, Region, Resource, Skin,
    Spell, UNKNOWN_SPECIES,
};
use crate::provider::{ChampionDetail, SummaryEntry, Supplement};

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn gender_unset(champion: &Champion) -> bool {
    matches!(champion.gender, None | Some(Gender::Unknown))
}

fn species_unset(champion: &Champion) -> bool {
    champion.species.is_empty()
        || (champion.species.len() == 1 && champion.species.contains(UNKNOWN_SPECIES))
}

fn regions_unset(champion: &Champion) -> bool {
    champion.regions.is_empty()
        || (champion.regions.len() == 1 && champion.regions.contains(&Region::Unknown))
}

/// Record identity from the catalog summary.
pub fn apply_summary(champion: &mut Champion, entry: &SummaryEntry) {
    if champion.name.trim().is_empty() {
        champion.name = entry.name.clone();
    }
    if champion.remote_id.is_none() {
        champion.remote_id = Some(entry.id.clone());
    }
}

/// Merge provider records into `champion`, filling only unset fields.
///
/// `public_base` is the URL prefix of this champion's asset directory; spell,
/// skin and passive URLs are derived from it.
pub fn merge(
    champion: &mut Champion,
    detail: &ChampionDetail,
    secondary: &[Supplement],
    public_base: &str,
) {
    if champion.name.trim().is_empty() && !detail.name.trim().is_empty() {
        champion.name = detail.name.clone();
    }

    if is_blank(&champion.description) {
        champion.description = secondary
            .iter()
            .find_map(|s| non_blank(&s.short_bio))
            .or_else(|| non_blank(&detail.lore));
    }

    if champion.class.is_none() {
        champion.class = secondary
            .iter()
            .find_map(|s| s.roles.first())
            .or_else(|| detail.tags.first())
            .map(|role| resolve::<ChampionClass>(role));
    }

    if champion.attack_range.is_none() {
        champion.attack_range = secondary
            .iter()
            .find_map(|s| s.attack_type.as_deref())
            .map(resolve::<AttackRange>)
            .or_else(|| detail.stats.attackrange.map(AttackRange::from_attack_range));
    }

    if champion.resource.is_none() {
        champion.resource = secondary
            .iter()
            .find_map(|s| s.resource.as_deref())
            .or(detail.partype.as_deref().filter(|p| !p.trim().is_empty()))
            .map(resolve::<Resource>);
    }

    if gender_unset(champion) {
        champion.gender = Some(
            secondary
                .iter()
                .find_map(|s| s.gender.as_deref())
                .map(resolve::<Gender>)
                .unwrap_or(Gender::Unknown),
        );
    }

    if species_unset(champion) {
        champion.species = secondary
            .iter()
            .map(|s| &s.species)
            .find(|species| !species.is_empty())
            .map(|species| species.iter().cloned().collect())
            .unwrap_or_else(|| BTreeSet::from([UNKNOWN_SPECIES.to_string()]));
    }

    if regions_unset(champion) {
        champion.regions = secondary
            .iter()
            .map(|s| &s.regions)
            .find(|regions| !regions.is_empty())
            .map(|regions| regions.iter().map(|r| resolve::<Region>(r)).collect())
            .unwrap_or_else(|| BTreeSet::from([Region::Unknown]));
    }

    if champion.release_date.is_none() {
        champion.release_date = secondary.iter().find_map(|s| s.release_date);
    }

    if champion.positions.is_empty() {
        if let Some(positions) = secondary
            .iter()
            .map(|s| &s.positions)
            .find(|positions| !positions.is_empty())
        {
            champion.positions = positions.iter().map(|p| normalize(p)).collect();
        }
    }

    if is_blank(&champion.passive_icon_url) && detail.passive.is_some() {
        champion.passive_icon_url = Some(format!("{public_base}/passive/icon.png"));
    }

    if champion.spells.is_empty() {
        champion.spells = detail
            .spells
            .iter()
            .map(|spell| Spell {
                name: spell.name.clone(),
                description: spell.description.clone(),
                cooldown: spell.cooldown_burn.clone(),
                image_url: format!(
                    "{public_base}/spells/{}",
                    sanitize_component(&spell.image.full)
                ),
            })
            .collect();
    }

    if champion.skins.is_empty() {
        champion.skins = detail
            .skins
            .iter()
            .map(|skin| Skin {
                name: skin.name.clone(),
                num: skin.num,
                splash_url: format!("{public_base}/skins/splash_{}.jpg", skin.num),
                loading_url: format!("{public_base}/skins/loading_{}.jpg", skin.num),
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::{DetailPassive, DetailSkin, DetailSpell, DetailStats, ImageRef};
    use chrono::NaiveDate;

    const BASE: &str = "/data/images/lol/en_US/champions/Ahri";

    fn detail() -> ChampionDetail {
        ChampionDetail {
            id: "Ahri".into(),
            name: "Ahri".into(),
            lore: Some("Long lore.".into()),
            tags: vec!["Mage".into(), "Assassin".into()],
            partype: Some("Mana".into()),
            stats: DetailStats {
                attackrange: Some(550.0),
            },
            passive: Some(DetailPassive {
                image: ImageRef {
                    full: "Ahri_SoulEater2.png".into(),
                },
            }),
            spells: vec![
                DetailSpell {
                    name: "Orb of Deception".into(),
                    description: "Q".into(),
                    cooldown_burn: "7".into(),
                    image: ImageRef {
                        full: "AhriQ.png".into(),
                    },
                },
                DetailSpell {
                    name: "Fox-Fire".into(),
                    description: "W".into(),
                    cooldown_burn: "9/8/7/6/5".into(),
                    image: ImageRef {
                        full: "AhriW.png".into(),
                    },
                },
            ],
            skins: vec![
                DetailSkin {
                    name: "default".into(),
                    num: 0,
                },
                DetailSkin {
                    name: "Dynasty Ahri".into(),
                    num: 1,
                },
            ],
        }
    }

    fn community() -> Supplement {
        Supplement {
            short_bio: Some("Short bio.".into()),
            roles: vec!["assassin".into()],
            attack_type: Some("melee".into()),
            ..Supplement::new("communitydragon")
        }
    }

    fn meraki() -> Supplement {
        Supplement {
            gender: Some("female".into()),
            species: vec!["Vastaya".into()],
            regions: vec!["Ionia".into()],
            release_date: NaiveDate::from_ymd_opt(2011, 12, 14),
            resource: Some("MANA".into()),
            positions: vec!["middle".into()],
            ..Supplement::new("meraki")
        }
    }

    #[test]
    fn test_secondary_wins_over_authoritative() {
        let mut champ = Champion::detected("Ahri");
        merge(&mut champ, &detail(), &[community(), meraki()], BASE);
        assert_eq!(champ.description.as_deref(), Some("Short bio."));
        assert_eq!(champ.class, Some(ChampionClass::Assassin));
        assert_eq!(champ.attack_range, Some(AttackRange::Melee));
        assert_eq!(champ.gender, Some(Gender::Female));
        assert_eq!(champ.regions, BTreeSet::from([Region::Ionia]));
        assert_eq!(champ.positions, BTreeSet::from(["MIDDLE".to_string()]));
        assert_eq!(champ.release_date, NaiveDate::from_ymd_opt(2011, 12, 14));
    }

    #[test]
    fn test_authoritative_fallbacks_without_secondaries() {
        let mut champ = Champion::detected("Ahri");
        merge(&mut champ, &detail(), &[], BASE);
        assert_eq!(champ.description.as_deref(), Some("Long lore."));
        assert_eq!(champ.class, Some(ChampionClass::Mage));
        assert_eq!(champ.attack_range, Some(AttackRange::Ranged));
        assert_eq!(champ.resource, Some(Resource::Mana));
    }

    #[test]
    fn test_secondary_only_fields_default_to_sentinels() {
        let mut champ = Champion::detected("Ahri");
        merge(&mut champ, &detail(), &[], BASE);
        assert_eq!(champ.gender, Some(Gender::Unknown));
        assert_eq!(champ.species, BTreeSet::from([UNKNOWN_SPECIES.to_string()]));
        assert_eq!(champ.regions, BTreeSet::from([Region::Unknown]));
        assert!(champ.release_date.is_none());
    }

    #[test]
    fn test_sentinels_replaced_when_secondary_returns() {
        let mut champ = Champion::detected("Ahri");
        merge(&mut champ, &detail(), &[], BASE);
        merge(&mut champ, &detail(), &[meraki()], BASE);
        assert_eq!(champ.gender, Some(Gender::Female));
        assert_eq!(champ.species, BTreeSet::from(["Vastaya".to_string()]));
        assert_eq!(champ.regions, BTreeSet::from([Region::Ionia]));
    }

    #[test]
    fn test_computed_attack_range_melee() {
        let mut d = detail();
        d.stats.attackrange = Some(125.0);
        let mut champ = Champion::detected("Garen");
        merge(&mut champ, &d, &[], BASE);
        assert_eq!(champ.attack_range, Some(AttackRange::Melee));
    }

    #[test]
    fn test_set_fields_are_not_overwritten() {
        let mut champ = Champion::detected("Ahri");
        champ.description = Some("Operator text".into());
        champ.class = Some(ChampionClass::Support);
        merge(&mut champ, &detail(), &[community()], BASE);
        assert_eq!(champ.description.as_deref(), Some("Operator text"));
        assert_eq!(champ.class, Some(ChampionClass::Support));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let secondary = [community(), meraki()];
        let mut once = Champion::detected("Ahri");
        merge(&mut once, &detail(), &secondary, BASE);
        let mut twice = once.clone();
        merge(&mut twice, &detail(), &secondary, BASE);
        assert_eq!(once, twice);

        let mut bare = Champion::detected("Ahri");
        merge(&mut bare, &detail(), &[], BASE);
        let again = {
            let mut c = bare.clone();
            merge(&mut c, &detail(), &[], BASE);
            c
        };
        assert_eq!(bare, again);
    }

    #[test]
    fn test_spells_and_skins_keep_provider_order() {
        let mut champ = Champion::detected("Ahri");
        merge(&mut champ, &detail(), &[], BASE);
        assert_eq!(champ.spells[0].name, "Orb of Deception");
        assert_eq!(champ.spells[1].cooldown, "9/8/7/6/5");
        assert_eq!(champ.spells[0].image_url, format!("{BASE}/spells/AhriQ.png"));
        assert_eq!(champ.skins[1].num, 1);
        assert_eq!(champ.skins[1].splash_url, format!("{BASE}/skins/splash_1.jpg"));
        assert_eq!(
            champ.passive_icon_url.as_deref(),
            Some("/data/images/lol/en_US/champions/Ahri/passive/icon.png")
        );
    }

    #[test]
    fn test_unknown_role_falls_back_without_failing() {
        let mut champ = Champion::detected("Ahri");
        let odd = Supplement {
            roles: vec!["totally-unknown-value".into()],
            ..Supplement::new("communitydragon")
        };
        merge(&mut champ, &detail(), &[odd], BASE);
        assert_eq!(champ.class, Some(ChampionClass::Unknown));
    }

    #[test]
    fn test_apply_summary_keeps_existing_identity() {
        let entry = SummaryEntry {
            id: "MonkeyKing".into(),
            key: 62,
            name: "Wukong".into(),
        };
        let mut champ = Champion::detected("Wukong");
        apply_summary(&mut champ, &entry);
        assert_eq!(champ.remote_id.as_deref(), Some("MonkeyKing"));

        champ.remote_id = Some("Custom".into());
        apply_summary(&mut champ, &entry);
        assert_eq!(champ.remote_id.as_deref(), Some("Custom"));
    }
}
