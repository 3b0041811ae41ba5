//! Storable record types.
//!
//! An application type becomes persistable by implementing [`Storable`],
//! usually through `#[derive(Storable)]`:
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use stored_rust::Storable;
//!
//! #[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
//! #[storable(table = "people", versioning = "delta", parents(Contact))]
//! struct Person {
//!     #[storable(index)]
//!     name: String,
//!     age: i64,
//! }
//! ```
//!
//! The type itself stays a plain struct. [`Record<T>`] wraps it with the
//! id, timestamps, history and the snapshot used for change detection.

mod lineage;
mod record;

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::backend::TableSchema;
use crate::error::StoreError;
use crate::versioning::Versioning;

pub use lineage::{Lineage, TypeKey};
pub use record::{Record, RecordState, Revision};

/// Index values by index name.
pub type IndexValues = BTreeMap<String, Value>;

/// Reserved keys of the serialized record object.
pub const ID_FIELD: &str = "id";
pub const CREATE_DATE_FIELD: &str = "_create_date";
pub const LAST_UPDATE_FIELD: &str = "_last_update";
pub const VERSION_HIST_FIELD: &str = "_version_hist";

/// Trait for types that can be stored as records.
pub trait Storable: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table (or collection) holding records of this type.
    const TABLE_NAME: &'static str;

    /// Versioning tag, see [`Versioning`]. Checked on first use.
    const VERSIONING: &'static str = Versioning::NONE;

    /// Names of the values returned by [`Storable::indexes`].
    const INDEX_NAMES: &'static [&'static str] = &[];

    /// Current index values. Keys should be exactly [`Storable::INDEX_NAMES`].
    fn indexes(&self) -> IndexValues {
        IndexValues::new()
    }

    /// Direct parents, in declaration order, for mapping resolution.
    fn parents() -> Vec<Lineage> {
        Vec::new()
    }

    fn type_key() -> TypeKey {
        TypeKey::of::<Self>()
    }

    fn lineage() -> Lineage {
        Lineage::new(Self::type_key(), Self::parents())
    }

    fn schema() -> TableSchema {
        TableSchema::new(Self::TABLE_NAME, Self::INDEX_NAMES)
    }

    fn versioning() -> Result<Versioning, StoreError> {
        Versioning::parse(Self::VERSIONING).ok_or_else(|| StoreError::InvalidVersioningMode {
            type_name: Self::type_key().name().to_string(),
            mode: Self::VERSIONING.to_string(),
        })
    }
}

/// JSON form of a field used as an index value. Values that cannot be
/// represented in JSON index as `null`.
pub fn index_value<V: Serialize + ?Sized>(value: &V) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Lineage of a parent type, for hand-written [`Storable::parents`].
pub fn lineage_of<P: Storable>() -> Lineage {
    P::lineage()
}
