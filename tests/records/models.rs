//! Record types used by the records suite.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stored_rust::record::IndexValues;
use stored_rust::Storable;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Storable)]
#[storable(table = "SimpleStorageTest", versioning = "none")]
pub struct SimpleStorage {
    pub name: String,
    pub descrip: String,
    pub age: i64,
    #[serde(default)]
    pub extra_data: Map<String, Value>,
}

impl Default for SimpleStorage {
    fn default() -> Self {
        SimpleStorage {
            name: "default name".to_string(),
            descrip: String::new(),
            age: 42,
            extra_data: Map::new(),
        }
    }
}

/// Derived indexes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Storable)]
#[storable(table = "IndexedData")]
pub struct IndexedData {
    #[storable(index = "my_name")]
    pub name: String,
    pub descrip: String,
    #[storable(index)]
    pub age: i64,
}

/// Table named after the struct, which is an SQL keyword.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Storable)]
pub struct Order {
    #[storable(index)]
    pub group: String,
    pub total: u32,
}

/// Hand-written impl, for an index computed from several fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub first: String,
    pub last: String,
    pub age: i64,
}

impl Storable for Person {
    const TABLE_NAME: &'static str = "people";
    const INDEX_NAMES: &'static [&'static str] = &["full_name", "half_age"];

    fn indexes(&self) -> IndexValues {
        let mut values = IndexValues::new();
        values.insert(
            "full_name".to_string(),
            Value::String(format!("{} {}", self.first, self.last)),
        );
        values.insert("half_age".to_string(), Value::from(self.age / 2));
        values
    }
}
