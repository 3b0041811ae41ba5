use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::{require_id, Backend, StoredRecord, TableSchema};
use crate::error::StoreError;

type Revisions = HashMap<String, Vec<StoredRecord>>;

/// Append-only driver (`journal`).
///
/// Every save appends a revision; reads see the latest one. Nothing is ever
/// removed, so `delete` fails with [`StoreError::DeleteNotSupported`].
#[derive(Clone)]
pub struct JournalBackend {
    tables: Arc<RwLock<HashMap<String, Revisions>>>,
}

impl Default for JournalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl JournalBackend {
    pub const DRIVER: &'static str = "journal";

    pub fn new() -> Self {
        JournalBackend {
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Every revision ever saved for `id`, oldest first.
    pub fn revisions(&self, table: &str, id: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("journal read"))?;
        Ok(tables
            .get(table)
            .and_then(|revisions| revisions.get(id))
            .cloned()
            .unwrap_or_default())
    }

    fn latest<F>(&self, schema: &TableSchema, predicate: F) -> Result<Vec<StoredRecord>, StoreError>
    where
        F: Fn(&StoredRecord) -> bool,
    {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("journal read"))?;
        let revisions = tables.get(&schema.table).ok_or_else(|| self.missing(schema))?;

        Ok(revisions
            .values()
            .filter_map(|log| log.last())
            .filter(|record| predicate(record))
            .cloned()
            .collect())
    }

    fn missing(&self, schema: &TableSchema) -> StoreError {
        StoreError::MissingTable {
            driver: Self::DRIVER.to_string(),
            table: schema.table.clone(),
        }
    }
}

impl Backend for JournalBackend {
    fn driver(&self) -> &str {
        Self::DRIVER
    }

    fn ensure_table(&self, schema: &TableSchema) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("journal write"))?;
        tables.entry(schema.table.clone()).or_default();
        Ok(())
    }

    fn find_one(&self, schema: &TableSchema, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("journal read"))?;
        let revisions = tables.get(&schema.table).ok_or_else(|| self.missing(schema))?;
        Ok(revisions.get(id).and_then(|log| log.last()).cloned())
    }

    fn find_all(&self, schema: &TableSchema) -> Result<Vec<StoredRecord>, StoreError> {
        self.latest(schema, |_| true)
    }

    fn find_by_index(
        &self,
        schema: &TableSchema,
        index_name: &str,
        value: &Value,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        schema.check_index(index_name)?;
        self.latest(schema, |record| record.index(index_name) == Some(value))
    }

    fn save(&self, schema: &TableSchema, record: &StoredRecord) -> Result<(), StoreError> {
        require_id(schema, record)?;
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("journal write"))?;
        let revisions = tables
            .get_mut(&schema.table)
            .ok_or_else(|| self.missing(schema))?;
        revisions
            .entry(record.id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn delete(&self, schema: &TableSchema, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::DeleteNotSupported {
            driver: Self::DRIVER.to_string(),
            table: schema.table.clone(),
        })
    }
}
