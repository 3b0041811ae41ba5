use std::collections::HashMap;
use std::sync::RwLock;

use super::Database;
use crate::error::StoreError;
use crate::record::{Lineage, Storable, TypeKey};

#[derive(Default)]
struct MappingState {
    default: Option<Database>,
    mapping: HashMap<TypeKey, Database>,
}

/// Which database each record type lives in.
///
/// Lookups walk the type's lineage, most specific first, and take the first
/// explicit mapping; failing that the default; failing that
/// [`StoreError::NoMapping`].
#[derive(Default)]
pub struct DatabaseMapping {
    state: RwLock<MappingState>,
}

impl DatabaseMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or with `None`, clear) the fallback database.
    pub fn set_default(&self, database: Option<Database>) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("mapping write"))?;
        match &database {
            Some(db) => log::debug!("default database set to {}", db.driver()),
            None => log::debug!("default database cleared"),
        }
        state.default = database;
        Ok(())
    }

    /// Map exactly `T`. Types that list `T` as an ancestor inherit the
    /// mapping unless they are mapped themselves.
    pub fn map_type<T: Storable>(&self, database: Database) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("mapping write"))?;
        log::debug!("mapping {} to {}", T::type_key().name(), database.driver());
        state.mapping.insert(T::type_key(), database);
        Ok(())
    }

    pub fn is_mapped<T: Storable>(&self) -> Result<bool, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("mapping read"))?;
        Ok(state.mapping.contains_key(&T::type_key()))
    }

    pub fn resolve<T: Storable>(&self) -> Result<Database, StoreError> {
        self.resolve_lineage(&T::lineage())
    }

    /// Like [`DatabaseMapping::resolve`], but `Ok(None)` instead of
    /// `NoMapping`.
    pub fn resolve_or_none<T: Storable>(&self) -> Result<Option<Database>, StoreError> {
        self.lookup(&T::lineage())
    }

    /// Resolve for a type known only by its lineage.
    pub fn resolve_lineage(&self, lineage: &Lineage) -> Result<Database, StoreError> {
        self.lookup(lineage)?.ok_or_else(|| StoreError::NoMapping {
            type_name: lineage.key().name().to_string(),
        })
    }

    /// Drop every mapping and the default.
    pub fn reset(&self) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::LockPoisoned("mapping write"))?;
        *state = MappingState::default();
        log::debug!("database mapping reset");
        Ok(())
    }

    fn lookup(&self, lineage: &Lineage) -> Result<Option<Database>, StoreError> {
        let order = lineage.linearize()?;
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::LockPoisoned("mapping read"))?;

        for key in &order {
            if let Some(db) = state.mapping.get(key) {
                log::trace!("{} resolved through {}", lineage.key().name(), key.name());
                return Ok(Some(db.clone()));
            }
        }
        Ok(state.default.clone())
    }
}
