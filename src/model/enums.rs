//! Closed enumerations for the free-text fields providers hand us.
//!
//! Every provider spells things its own way (`"Shadow Isles"`, `"shadow-isles"`,
//! `"SHADOW_ISLES"`), so all input goes through [`normalize`] and then a single
//! table lookup per enum. Anything that still doesn't resolve lands on the
//! enum's fallback member with a warning; resolution never fails.

use serde::{Deserialize, Serialize};

/// A catalog enumeration that can be resolved from provider free text.
pub trait CatalogEnum: Sized + Copy + 'static {
    /// Human-readable name used in log lines.
    const KIND: &'static str;

    /// Member used when the input can't be resolved.
    const FALLBACK: Self;

    /// Look up an already-normalized key (see [`normalize`]).
    fn from_normalized(key: &str) -> Option<Self>;

    /// Canonical upper-snake-case name, also the stored representation.
    fn as_str(&self) -> &'static str;
}

/// Normalize provider text into an enum key: trim, upper-case, spaces and
/// dashes become `_`, apostrophes are dropped.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Resolve provider text to an enum member, falling back (and logging) when
/// the value is unknown.
pub fn resolve<E: CatalogEnum>(raw: &str) -> E {
    match E::from_normalized(&normalize(raw)) {
        Some(value) => value,
        None => {
            tracing::warn!(
                kind = E::KIND,
                value = raw,
                fallback = E::FALLBACK.as_str(),
                "Unknown enum value, using fallback"
            );
            E::FALLBACK
        }
    }
}

/// Strict variant for operator input: unknown values are an error instead of
/// silently becoming the fallback.
pub fn parse_strict<E: CatalogEnum>(raw: &str) -> Result<E, String> {
    E::from_normalized(&normalize(raw))
        .ok_or_else(|| format!("unknown {} value '{}'", E::KIND, raw))
}

/// Like [`parse_strict`], but also refuses the fallback member. The automated
/// merge treats that member as unset, so storing it by hand would not stick.
pub fn parse_known<E: CatalogEnum>(raw: &str) -> Result<E, String> {
    let value = parse_strict::<E>(raw)?;
    if value.as_str() == E::FALLBACK.as_str() {
        return Err(format!(
            "{} '{}' means unset and would be overwritten by the next sync",
            E::KIND,
            raw
        ));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl CatalogEnum for Gender {
    const KIND: &'static str = "gender";
    const FALLBACK: Self = Self::Unknown;

    fn from_normalized(key: &str) -> Option<Self> {
        match key {
            "MALE" | "M" => Some(Self::Male),
            "FEMALE" | "F" => Some(Self::Female),
            "OTHER" | "NON_BINARY" | "NONE" => Some(Self::Other),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Primary class/role as the game client labels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChampionClass {
    Assassin,
    Fighter,
    Mage,
    Marksman,
    Support,
    Tank,
    Specialist,
    Unknown,
}

impl CatalogEnum for ChampionClass {
    const KIND: &'static str = "class";
    const FALLBACK: Self = Self::Unknown;

    fn from_normalized(key: &str) -> Option<Self> {
        match key {
            "ASSASSIN" | "SLAYER" => Some(Self::Assassin),
            "FIGHTER" | "JUGGERNAUT" | "DIVER" => Some(Self::Fighter),
            "MAGE" | "BURST" | "BATTLEMAGE" | "ARTILLERY" => Some(Self::Mage),
            "MARKSMAN" => Some(Self::Marksman),
            "SUPPORT" | "ENCHANTER" | "CATCHER" | "CONTROLLER" => Some(Self::Support),
            "TANK" | "VANGUARD" | "WARDEN" => Some(Self::Tank),
            "SPECIALIST" => Some(Self::Specialist),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Assassin => "ASSASSIN",
            Self::Fighter => "FIGHTER",
            Self::Mage => "MAGE",
            Self::Marksman => "MARKSMAN",
            Self::Support => "SUPPORT",
            Self::Tank => "TANK",
            Self::Specialist => "SPECIALIST",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    BandleCity,
    Bilgewater,
    Demacia,
    Freljord,
    Ionia,
    Ixtal,
    Noxus,
    Piltover,
    ShadowIsles,
    Shurima,
    Targon,
    Void,
    Zaun,
    Runeterra,
    Unknown,
}

impl CatalogEnum for Region {
    const KIND: &'static str = "region";
    const FALLBACK: Self = Self::Unknown;

    fn from_normalized(key: &str) -> Option<Self> {
        match key {
            "BANDLE_CITY" | "BANDLE" | "BANDLECITY" => Some(Self::BandleCity),
            "BILGEWATER" => Some(Self::Bilgewater),
            "DEMACIA" => Some(Self::Demacia),
            "FRELJORD" | "THE_FRELJORD" => Some(Self::Freljord),
            "IONIA" => Some(Self::Ionia),
            "IXTAL" => Some(Self::Ixtal),
            "NOXUS" => Some(Self::Noxus),
            "PILTOVER" => Some(Self::Piltover),
            "SHADOW_ISLES" | "THE_SHADOW_ISLES" | "SHADOWISLES" => Some(Self::ShadowIsles),
            "SHURIMA" => Some(Self::Shurima),
            "TARGON" | "MOUNT_TARGON" => Some(Self::Targon),
            "VOID" | "THE_VOID" => Some(Self::Void),
            "ZAUN" => Some(Self::Zaun),
            "RUNETERRA" => Some(Self::Runeterra),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::BandleCity => "BANDLE_CITY",
            Self::Bilgewater => "BILGEWATER",
            Self::Demacia => "DEMACIA",
            Self::Freljord => "FRELJORD",
            Self::Ionia => "IONIA",
            Self::Ixtal => "IXTAL",
            Self::Noxus => "NOXUS",
            Self::Piltover => "PILTOVER",
            Self::ShadowIsles => "SHADOW_ISLES",
            Self::Shurima => "SHURIMA",
            Self::Targon => "TARGON",
            Self::Void => "VOID",
            Self::Zaun => "ZAUN",
            Self::Runeterra => "RUNETERRA",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Ability resource bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    Mana,
    Energy,
    /// Manaless, cooldowns only.
    None,
    Health,
    Rage,
    Fury,
    Ferocity,
    Heat,
    Grit,
    Flow,
    BloodWell,
    Courage,
    Shield,
    Other,
}

impl CatalogEnum for Resource {
    const KIND: &'static str = "resource";
    const FALLBACK: Self = Self::Other;

    fn from_normalized(key: &str) -> Option<Self> {
        match key {
            "MANA" => Some(Self::Mana),
            "ENERGY" => Some(Self::Energy),
            "NONE" | "MANALESS" | "NO_COST" | "COOLDOWNS" => Some(Self::None),
            "HEALTH" | "HEALTH_COSTS" | "CURRENT_HEALTH" => Some(Self::Health),
            "RAGE" => Some(Self::Rage),
            "FURY" => Some(Self::Fury),
            "FEROCITY" => Some(Self::Ferocity),
            "HEAT" => Some(Self::Heat),
            "GRIT" => Some(Self::Grit),
            "FLOW" => Some(Self::Flow),
            "BLOOD_WELL" | "BLOODWELL" => Some(Self::BloodWell),
            "COURAGE" => Some(Self::Courage),
            "SHIELD" => Some(Self::Shield),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Mana => "MANA",
            Self::Energy => "ENERGY",
            Self::None => "NONE",
            Self::Health => "HEALTH",
            Self::Rage => "RAGE",
            Self::Fury => "FURY",
            Self::Ferocity => "FEROCITY",
            Self::Heat => "HEAT",
            Self::Grit => "GRIT",
            Self::Flow => "FLOW",
            Self::BloodWell => "BLOOD_WELL",
            Self::Courage => "COURAGE",
            Self::Shield => "SHIELD",
            Self::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackRange {
    Melee,
    Ranged,
    Unknown,
}

impl AttackRange {
    /// Basic-attack range above which a champion counts as ranged.
    pub const RANGED_THRESHOLD: f64 = 200.0;

    /// Derive the range type from the numeric attack range.
    pub fn from_attack_range(range: f64) -> Self {
        if range > Self::RANGED_THRESHOLD {
            Self::Ranged
        } else {
            Self::Melee
        }
    }
}

impl CatalogEnum for AttackRange {
    const KIND: &'static str = "attack range";
    const FALLBACK: Self = Self::Unknown;

    fn from_normalized(key: &str) -> Option<Self> {
        match key {
            "MELEE" => Some(Self::Melee),
            "RANGED" => Some(Self::Ranged),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Melee => "MELEE",
            Self::Ranged => "RANGED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Per-entity position in the sync pipeline.
///
/// `AssetsDownloaded` is reserved: nothing transitions into it today, but
/// stored rows carrying it still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Seen in the remote catalog, nothing merged yet.
    Detected,
    /// Metadata merged and persisted.
    MetadataSynced,
    AssetsDownloaded,
    /// Metadata and assets done, entity complete.
    Ready,
    /// A stage failed or the entity is still missing required data.
    Incomplete,
}

impl SyncStatus {
    /// Convert to the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "DETECTED",
            Self::MetadataSynced => "METADATA_SYNCED",
            Self::AssetsDownloaded => "ASSETS_DOWNLOADED",
            Self::Ready => "READY",
            Self::Incomplete => "INCOMPLETE",
        }
    }

    /// Parse from the string stored in the database.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DETECTED" => Some(Self::Detected),
            "METADATA_SYNCED" => Some(Self::MetadataSynced),
            "ASSETS_DOWNLOADED" => Some(Self::AssetsDownloaded),
            "READY" => Some(Self::Ready),
            "INCOMPLETE" => Some(Self::Incomplete),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Shadow Isles "), "SHADOW_ISLES");
        assert_eq!(normalize("bandle-city"), "BANDLE_CITY");
        assert_eq!(normalize("Kai'Sa"), "KAISA");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_resolve_region_with_spaces() {
        assert_eq!(resolve::<Region>("Shadow Isles"), Region::ShadowIsles);
        assert_eq!(resolve::<Region>("the-void"), Region::Void);
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        assert_eq!(resolve::<Region>("totally-unknown-value"), Region::Unknown);
        assert_eq!(resolve::<Gender>("totally-unknown-value"), Gender::Unknown);
        assert_eq!(
            resolve::<Resource>("totally-unknown-value"),
            Resource::Other
        );
        assert_eq!(
            resolve::<ChampionClass>("totally-unknown-value"),
            ChampionClass::Unknown
        );
    }

    #[test]
    fn test_resolve_lowercase_role() {
        assert_eq!(resolve::<ChampionClass>("fighter"), ChampionClass::Fighter);
        assert_eq!(resolve::<AttackRange>("ranged"), AttackRange::Ranged);
        assert_eq!(resolve::<Resource>("Blood Well"), Resource::BloodWell);
        assert_eq!(resolve::<Resource>("Manaless"), Resource::None);
    }

    #[test]
    fn test_parse_strict_rejects_unknown() {
        assert_eq!(parse_strict::<Gender>("female"), Ok(Gender::Female));
        assert!(parse_strict::<Gender>("helicopter").is_err());
    }

    #[test]
    fn test_parse_known_refuses_fallback() {
        assert_eq!(parse_known::<Region>("noxus"), Ok(Region::Noxus));
        assert!(parse_known::<Region>("unknown").is_err());
        assert!(parse_known::<Gender>("Unknown").is_err());
        assert!(parse_known::<Gender>("helicopter").is_err());
    }

    #[test]
    fn test_as_str_resolves_back() {
        for region in [Region::BandleCity, Region::ShadowIsles, Region::Unknown] {
            assert_eq!(Region::from_normalized(region.as_str()), Some(region));
        }
    }

    #[test]
    fn test_attack_range_threshold() {
        assert_eq!(AttackRange::from_attack_range(125.0), AttackRange::Melee);
        assert_eq!(AttackRange::from_attack_range(200.0), AttackRange::Melee);
        assert_eq!(AttackRange::from_attack_range(550.0), AttackRange::Ranged);
    }

    #[test]
    fn test_sync_status_from_invalid() {
        assert_eq!(SyncStatus::from_str("READY"), Some(SyncStatus::Ready));
        assert_eq!(SyncStatus::from_str("ready"), None);
    }
}
