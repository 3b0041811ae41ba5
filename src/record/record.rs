use std::ops::{Deref, DerefMut};

use serde_json::{Map, Value};

use super::{
    IndexValues, Storable, CREATE_DATE_FIELD, ID_FIELD, LAST_UPDATE_FIELD, VERSION_HIST_FIELD,
};
use crate::error::StoreError;
use crate::history::{self, HistoryEntry};
use crate::timestamp::Timestamp;
use crate::versioning::Versioning;

/// Where a record instance stands relative to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Never saved or loaded in this process.
    Unsaved,
    /// Matches what was last saved or loaded.
    Saved,
    /// Changed since the last save or load.
    Modified,
}

/// A historical version reconstructed from `_version_hist`.
#[derive(Debug, Clone)]
pub struct Revision<T> {
    pub record: Record<T>,
    /// When this version was replaced by the next one; `None` for the
    /// current version.
    pub superseded_at: Option<Timestamp>,
}

/// A storable value plus the bookkeeping every stored record carries.
///
/// Derefs to the wrapped value, so fields read and write as usual:
///
/// ```ignore
/// let mut person = Record::new(Person { name: "Pre".into(), ..Default::default() });
/// person.name = "Post".into();
/// ```
#[derive(Debug, Clone)]
pub struct Record<T> {
    id: String,
    data: T,
    create_date: Option<Timestamp>,
    last_update: Option<Timestamp>,
    history: Vec<HistoryEntry>,
    // Payload as of the last save or load; never persisted.
    original: Option<Value>,
}

impl<T: Storable> Record<T> {
    pub fn new(data: T) -> Self {
        Record {
            id: String::new(),
            data,
            create_date: None,
            last_update: None,
            history: Vec::new(),
            original: None,
        }
    }

    pub fn with_id(id: impl Into<String>, data: T) -> Self {
        let mut record = Record::new(data);
        record.id = id.into();
        record
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }

    pub fn create_date(&self) -> Option<Timestamp> {
        self.create_date
    }

    pub fn last_update(&self) -> Option<Timestamp> {
        self.last_update
    }

    /// Stored diff history, newest first. Empty for unversioned types.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Payload captured at the last save or load.
    pub fn original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    pub fn state(&self) -> RecordState {
        match &self.original {
            None => RecordState::Unsaved,
            Some(original) => match self.payload() {
                Ok(current) if &current == original => RecordState::Saved,
                _ => RecordState::Modified,
            },
        }
    }

    pub fn index_values(&self) -> IndexValues {
        self.data.indexes()
    }

    /// Full serialized form, without touching timestamps.
    pub fn to_value(&self) -> Result<Value, StoreError> {
        let mut map = self.payload_map()?;
        if let Some(stamp) = self.last_update {
            map.insert(LAST_UPDATE_FIELD.to_string(), Value::String(stamp.to_string()));
        }
        if matches!(T::versioning(), Ok(Versioning::DeltaHistory)) {
            map.insert(VERSION_HIST_FIELD.to_string(), history::encode_history(&self.history));
        }
        Ok(Value::Object(map))
    }

    /// Serialize to JSON text. Refreshes `_last_update`.
    pub fn to_data(&mut self) -> Result<String, StoreError> {
        self.last_update = Some(Timestamp::now());
        let value = self.to_value()?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn from_data(text: &str) -> Result<Self, StoreError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        let Value::Object(mut map) = value else {
            return Err(invalid::<T>("stored record is not a JSON object"));
        };

        let id = match map.remove(ID_FIELD) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(id)) => id,
            Some(_) => return Err(invalid::<T>("id is not a string")),
        };
        let create_date = take_timestamp::<T>(&mut map, CREATE_DATE_FIELD)?;
        let last_update = take_timestamp::<T>(&mut map, LAST_UPDATE_FIELD)?;
        let history = match map.remove(VERSION_HIST_FIELD) {
            Some(value) => history::decode_history(&value)?,
            None => Vec::new(),
        };

        let data = serde_json::from_value(Value::Object(map))?;
        Ok(Record {
            id,
            data,
            create_date,
            last_update,
            history,
            original: None,
        })
    }

    /// Version history as of the last save or load, newest first.
    ///
    /// `Ok(None)` when the type is not versioned. The first revision is the
    /// record itself with no `superseded_at`.
    pub fn version_history(&self) -> Result<Option<Vec<Revision<T>>>, StoreError> {
        if T::versioning()? == Versioning::None {
            return Ok(None);
        }

        let base = match &self.original {
            Some(original) => original.clone(),
            None => self.payload()?,
        };

        let mut revisions = Vec::with_capacity(self.history.len() + 1);
        for step in history::parse_history(base, &self.history) {
            let (value, superseded_at) = step?;
            revisions.push(Revision {
                record: Record::from_value(value)?,
                superseded_at,
            });
        }
        Ok(Some(revisions))
    }

    /// The part of the serialized form that version history tracks:
    /// everything except `_last_update` and `_version_hist`.
    pub(crate) fn payload(&self) -> Result<Value, StoreError> {
        self.payload_map().map(Value::Object)
    }

    fn payload_map(&self) -> Result<Map<String, Value>, StoreError> {
        let Value::Object(fields) = serde_json::to_value(&self.data)? else {
            return Err(invalid::<T>("record fields must serialize to a JSON object"));
        };

        let mut map = Map::new();
        map.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        if let Some(stamp) = self.create_date {
            map.insert(CREATE_DATE_FIELD.to_string(), Value::String(stamp.to_string()));
        }
        for (key, value) in fields {
            if is_reserved(&key) {
                return Err(invalid::<T>(&format!("field `{}` uses a reserved name", key)));
            }
            map.insert(key, value);
        }
        Ok(map)
    }

    pub(crate) fn stamp(&mut self, now: Timestamp) {
        if self.create_date.is_none() {
            self.create_date = Some(now);
        }
        self.last_update = Some(now);
    }

    pub(crate) fn set_history(&mut self, history: Vec<HistoryEntry>) {
        self.history = history;
    }

    /// Everything a save may change before the backend has accepted it.
    pub(crate) fn bookkeeping(&self) -> Bookkeeping {
        Bookkeeping {
            id: self.id.clone(),
            create_date: self.create_date,
            last_update: self.last_update,
            history: self.history.clone(),
        }
    }

    pub(crate) fn restore(&mut self, saved: Bookkeeping) {
        self.id = saved.id;
        self.create_date = saved.create_date;
        self.last_update = saved.last_update;
        self.history = saved.history;
    }

    pub(crate) fn capture_original(&mut self) -> Result<(), StoreError> {
        self.original = Some(self.payload()?);
        Ok(())
    }
}

pub(crate) struct Bookkeeping {
    id: String,
    create_date: Option<Timestamp>,
    last_update: Option<Timestamp>,
    history: Vec<HistoryEntry>,
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for Record<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

fn is_reserved(key: &str) -> bool {
    matches!(
        key,
        ID_FIELD | CREATE_DATE_FIELD | LAST_UPDATE_FIELD | VERSION_HIST_FIELD
    )
}

fn invalid<T: Storable>(reason: &str) -> StoreError {
    StoreError::InvalidRecord {
        table: T::TABLE_NAME.to_string(),
        reason: reason.to_string(),
    }
}

fn take_timestamp<T: Storable>(
    map: &mut Map<String, Value>,
    field: &str,
) -> Result<Option<Timestamp>, StoreError> {
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Timestamp::parse(&text)
            .map(Some)
            .map_err(|e| invalid::<T>(&format!("{}: {}", field, e))),
        Some(_) => Err(invalid::<T>(&format!("{} is not a string", field))),
    }
}
