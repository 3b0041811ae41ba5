//! Database configuration and the type-to-database mapping.
//!
//! ```ignore
//! use stored_rust::mapping::{self, Database, DatabaseConfig};
//!
//! mapping::default_database(Some(Database::open(DatabaseConfig::new("memory"))?))?;
//! mapping::class_database::<AuditEntry>(Database::new("sqlite", [("filename", "audit.db")])?)?;
//! ```
//!
//! Most code uses the process-wide mapping through the free functions here.
//! A [`DatabaseMapping`] can also be created and passed around explicitly.

mod database;
mod registry;

use std::sync::OnceLock;

use crate::error::StoreError;
use crate::record::Storable;

pub use database::{Database, DatabaseConfig, DriverParams};
pub use registry::DatabaseMapping;

static GLOBAL: OnceLock<DatabaseMapping> = OnceLock::new();

/// The process-wide mapping.
pub fn global() -> &'static DatabaseMapping {
    GLOBAL.get_or_init(DatabaseMapping::new)
}

/// Set or clear the process-wide default database.
pub fn default_database(database: Option<Database>) -> Result<(), StoreError> {
    global().set_default(database)
}

/// Map `T` (and, through lineage, its descendants) in the process-wide
/// mapping.
pub fn class_database<T: Storable>(database: Database) -> Result<(), StoreError> {
    global().map_type::<T>(database)
}

/// Forget every process-wide mapping and the default.
pub fn clear_database_config() -> Result<(), StoreError> {
    global().reset()
}

/// Database for `T` in the process-wide mapping.
pub fn get_mapping<T: Storable>() -> Result<Database, StoreError> {
    global().resolve::<T>()
}

/// `Ok(None)` instead of `NoMapping`.
pub fn get_mapping_or_none<T: Storable>() -> Result<Option<Database>, StoreError> {
    global().resolve_or_none::<T>()
}
