use std::marker::PhantomData;

use serde_json::Value;

use super::gettable::Gettable;
use crate::backend::{StoredRecord, TableSchema};
use crate::error::StoreError;
use crate::history;
use crate::json;
use crate::mapping::{self, Database, DatabaseMapping};
use crate::record::{Record, Storable};
use crate::timestamp::{new_id, Timestamp};
use crate::versioning::Versioning;

/// Typed access to the records of one type.
///
/// The database is resolved on every call, so mapping changes take effect
/// immediately.
pub struct RecordRepository<'a, T> {
    mapping: &'a DatabaseMapping,
    _marker: PhantomData<T>,
}

impl<'a, T: Storable> RecordRepository<'a, T> {
    pub fn new(mapping: &'a DatabaseMapping) -> Self {
        Self {
            mapping,
            _marker: PhantomData,
        }
    }

    /// The database records of this type currently resolve to.
    pub fn database(&self) -> Result<Database, StoreError> {
        self.mapping.resolve::<T>()
    }

    pub fn ensure_table(&self) -> Result<(), StoreError> {
        self.database()?.backend().ensure_table(&T::schema())
    }

    pub fn find_one(&self, id: &str) -> Result<Option<Record<T>>, StoreError> {
        let found = self.database()?.backend().find_one(&T::schema(), id)?;
        found.map(|stored| self.load(stored)).transpose()
    }

    pub fn find_all(&self) -> Result<Vec<Record<T>>, StoreError> {
        let found = self.database()?.backend().find_all(&T::schema())?;
        self.load_all(found)
    }

    /// Records whose index `name` equals `value`.
    pub fn find_by_index(
        &self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Record<T>>, StoreError> {
        let value = value.into();
        let found = self
            .database()?
            .backend()
            .find_by_index(&T::schema(), name, &value)?;
        self.load_all(found)
    }

    /// Get one record by id, or several by a list of ids.
    pub fn get<G: Gettable<T>>(&self, ids: G) -> Result<G::Output, StoreError> {
        ids.get_from(self)
    }

    /// Persist `record`.
    ///
    /// Assigns an id if it has none, stamps the timestamps and, for types
    /// keeping delta history, records the change since the last save or load.
    /// On failure the id, timestamps and history are left as they were.
    pub fn save(&self, record: &mut Record<T>) -> Result<(), StoreError> {
        let versioning = T::versioning()?;
        let database = self.database()?;
        let schema = T::schema();

        let saved = record.bookkeeping();
        if let Err(err) = write(record, versioning, &database, &schema) {
            record.restore(saved);
            return Err(err);
        }

        log::debug!(
            "saved {}:{} to {} ({} history entries)",
            schema.table,
            record.id(),
            database.driver(),
            record.history().len()
        );
        record.capture_original()
    }

    /// Remove `record` from its database. Unsaved records are left alone.
    pub fn delete(&self, record: &Record<T>) -> Result<(), StoreError> {
        if record.id().is_empty() {
            return Ok(());
        }
        let database = self.database()?;
        database.backend().delete(&T::schema(), record.id())?;
        log::debug!("deleted {}:{} from {}", T::TABLE_NAME, record.id(), database.driver());
        Ok(())
    }

    fn load(&self, stored: StoredRecord) -> Result<Record<T>, StoreError> {
        let mut record = Record::<T>::from_data(&stored.data)?;
        if record.id() != stored.id {
            log::warn!(
                "{}: stored key {:?} does not match record id {:?}",
                T::TABLE_NAME,
                stored.id,
                record.id()
            );
            return Err(StoreError::InvalidRecord {
                table: T::TABLE_NAME.to_string(),
                reason: format!("stored under {:?} but carries id {:?}", stored.id, record.id()),
            });
        }
        record.capture_original()?;
        Ok(record)
    }

    fn load_all(&self, found: Vec<StoredRecord>) -> Result<Vec<Record<T>>, StoreError> {
        let records = found
            .into_iter()
            .map(|stored| self.load(stored))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("loaded {} {} records", records.len(), T::TABLE_NAME);
        Ok(records)
    }
}

/// Extension trait for typed record access on a [`DatabaseMapping`].
pub trait RecordsExt {
    fn records<T: Storable>(&self) -> RecordRepository<'_, T>;
}

impl RecordsExt for DatabaseMapping {
    fn records<T: Storable>(&self) -> RecordRepository<'_, T> {
        RecordRepository::new(self)
    }
}

/// Typed access through the process-wide mapping.
pub fn records<T: Storable>() -> RecordRepository<'static, T> {
    RecordRepository::new(mapping::global())
}

fn write<T: Storable>(
    record: &mut Record<T>,
    versioning: Versioning,
    database: &Database,
    schema: &TableSchema,
) -> Result<(), StoreError> {
    if record.id().is_empty() {
        record.set_id(new_id());
    }
    let now = Timestamp::now();
    record.stamp(now);

    if versioning.keeps_history() {
        if let Some(original) = record.original() {
            let current = record.payload()?;
            let diff = json::diff(original, &current)?;
            if diff.is_unchanged() {
                log::trace!("{}:{} unchanged, no history entry", schema.table, record.id());
            } else {
                let previous = record.history().to_vec();
                record.set_history(history::append_history_at(diff, now, previous));
            }
        }
    }

    let stored = StoredRecord {
        id: record.id().to_string(),
        data: serde_json::to_string(&record.to_value()?)?,
        indexes: record.index_values(),
    };
    database.backend().save(schema, &stored)
}
