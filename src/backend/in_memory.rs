//! InMemoryBackend - HashMap-backed driver for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::{require_id, Backend, StoredRecord, TableSchema};
use crate::error::StoreError;

type Tables = HashMap<String, HashMap<String, StoredRecord>>;

/// In-memory driver (`memory`).
///
/// Records live in one map per table, keyed by id. Clone-friendly via Arc;
/// clones share data.
#[derive(Clone)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<Tables>>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub const DRIVER: &'static str = "memory";

    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn missing(schema: &TableSchema) -> StoreError {
        StoreError::MissingTable {
            driver: Self::DRIVER.to_string(),
            table: schema.table.clone(),
        }
    }

    fn scan<F>(&self, schema: &TableSchema, predicate: F) -> Result<Vec<StoredRecord>, StoreError>
    where
        F: Fn(&StoredRecord) -> bool,
    {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("memory read"))?;
        let rows = tables
            .get(&schema.table)
            .ok_or_else(|| Self::missing(schema))?;
        Ok(rows
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect())
    }
}

impl Backend for InMemoryBackend {
    fn driver(&self) -> &str {
        Self::DRIVER
    }

    fn ensure_table(&self, schema: &TableSchema) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("memory write"))?;
        tables.entry(schema.table.clone()).or_default();
        Ok(())
    }

    fn find_one(&self, schema: &TableSchema, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("memory read"))?;
        let rows = tables
            .get(&schema.table)
            .ok_or_else(|| Self::missing(schema))?;
        Ok(rows.get(id).cloned())
    }

    fn find_all(&self, schema: &TableSchema) -> Result<Vec<StoredRecord>, StoreError> {
        self.scan(schema, |_| true)
    }

    fn find_by_index(
        &self,
        schema: &TableSchema,
        index_name: &str,
        value: &Value,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        schema.check_index(index_name)?;
        self.scan(schema, |record| record.index(index_name) == Some(value))
    }

    fn save(&self, schema: &TableSchema, record: &StoredRecord) -> Result<(), StoreError> {
        require_id(schema, record)?;
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("memory write"))?;
        let rows = tables
            .get_mut(&schema.table)
            .ok_or_else(|| Self::missing(schema))?;
        rows.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, schema: &TableSchema, id: &str) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("memory write"))?;
        let rows = tables
            .get_mut(&schema.table)
            .ok_or_else(|| Self::missing(schema))?;
        rows.remove(id);
        Ok(())
    }
}
