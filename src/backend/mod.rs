//! Backend dispatch contract and the bundled drivers.
//!
//! A [`Backend`] stores records of any type in raw form: an id, the record's
//! JSON text, and the values of its declared indexes. Typed access, id
//! assignment, timestamps and version history live above this layer in
//! [`RecordRepository`](crate::RecordRepository), so every driver gets them
//! for free.
//!
//! Bundled drivers:
//!
//! | kind      | type                | delete |
//! |-----------|---------------------|--------|
//! | `memory`  | [`InMemoryBackend`] | yes    |
//! | `journal` | [`JournalBackend`]  | no     |
//! | `sqlite`  | `SqliteBackend`     | yes    |

mod in_memory;
mod journal;
#[cfg(feature = "sqlite")]
mod sqlite;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::StoreError;

pub use in_memory::InMemoryBackend;
pub use journal::JournalBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

/// Physical layout of one record type: where it lives and what it indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table: String,
    pub index_names: Vec<String>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, index_names: &[&str]) -> Self {
        TableSchema {
            table: table.into(),
            index_names: index_names.iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.index_names.iter().any(|n| n == name)
    }

    pub(crate) fn check_index(&self, name: &str) -> Result<(), StoreError> {
        if self.has_index(name) {
            Ok(())
        } else {
            Err(StoreError::UnknownIndex {
                table: self.table.clone(),
                index: name.to_string(),
            })
        }
    }
}

/// A record as a backend sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    /// The full serialized record (a JSON object).
    pub data: String,
    /// Current index values, keyed by index name.
    pub indexes: BTreeMap<String, Value>,
}

impl StoredRecord {
    pub fn index(&self, name: &str) -> Option<&Value> {
        self.indexes.get(name)
    }
}

/// The operations every storage driver provides.
///
/// `save` and `delete` are the only mutating calls; `ensure_table` mutates
/// but must be idempotent. Records handed to `save` always carry an id.
pub trait Backend: Send + Sync {
    /// Driver kind, e.g. `"sqlite"`.
    fn driver(&self) -> &str;

    /// Create whatever structure `schema` needs. Safe to repeat.
    fn ensure_table(&self, schema: &TableSchema) -> Result<(), StoreError>;

    /// `Ok(None)` when no record has this id.
    fn find_one(&self, schema: &TableSchema, id: &str) -> Result<Option<StoredRecord>, StoreError>;

    /// Every record in the table, in no particular order.
    fn find_all(&self, schema: &TableSchema) -> Result<Vec<StoredRecord>, StoreError>;

    /// Records whose index `index_name` equals `value` exactly.
    fn find_by_index(
        &self,
        schema: &TableSchema,
        index_name: &str,
        value: &Value,
    ) -> Result<Vec<StoredRecord>, StoreError>;

    /// Insert or replace by id.
    fn save(&self, schema: &TableSchema, record: &StoredRecord) -> Result<(), StoreError>;

    /// Remove a record permanently, or fail with
    /// [`StoreError::DeleteNotSupported`].
    fn delete(&self, schema: &TableSchema, id: &str) -> Result<(), StoreError>;
}

pub(crate) fn require_id(schema: &TableSchema, record: &StoredRecord) -> Result<(), StoreError> {
    if record.id.is_empty() {
        return Err(StoreError::InvalidRecord {
            table: schema.table.clone(),
            reason: "cannot save a record without an id".into(),
        });
    }
    Ok(())
}
