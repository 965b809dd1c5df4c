//! Catalog entity model.

pub mod champion;
pub mod enums;

pub use champion::{Champion, Skin, Spell, UNKNOWN_SPECIES};
pub use enums::{
    normalize, parse_known, parse_strict, resolve, AttackRange, CatalogEnum, ChampionClass, Gender, Region,
    Resource, SyncStatus,
};
