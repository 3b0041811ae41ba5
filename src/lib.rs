// Lets `#[derive(Storable)]` refer to `::stored_rust` from inside this crate.
extern crate self as stored_rust;

pub mod backend;
pub mod backup;
mod error;
pub mod history;
pub mod json;
pub mod mapping;
pub mod record;
mod repository;
mod timestamp;
mod versioning;

pub use backend::{Backend, InMemoryBackend, JournalBackend, StoredRecord, TableSchema};
#[cfg(feature = "sqlite")]
pub use backend::SqliteBackend;
pub use backup::{Backup, BackupReport};
pub use error::StoreError;
pub use history::HistoryEntry;
pub use json::{Diff, DiffError};
pub use mapping::{Database, DatabaseConfig, DatabaseMapping};
pub use record::{Record, RecordState, Revision, Storable};
pub use repository::{records, Gettable, RecordRepository, RecordsExt};
pub use timestamp::{new_id, Timestamp, TimestampError};
pub use versioning::Versioning;

// Re-export the derive macro
pub use stored_rust_macros::Storable;
