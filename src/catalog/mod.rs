//! Local champion catalog.
//!
//! SQLite-backed storage for the synced entities plus the small amount of
//! run bookkeeping the sync engine needs:
//! - Champion rows keyed by a stable numeric id, looked up by name
//! - The last fully-synced remote version tag
//! - A history of sync runs for status reporting

pub mod db;
pub mod error;
pub mod schema;
pub mod types;

pub use db::{CatalogStore, SqliteCatalog, VersionStore};
pub use error::StoreError;
pub use types::{SyncRunRecord, SyncRunStats};
