use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::array::{diff_arrays, patch_array, ArrayOp};
use super::DiffError;

/// A structural edit script between two JSON values.
///
/// `Diff` values are themselves JSON-compatible; this is what ends up inside
/// a record's `_version_hist` field. The serialized shapes are:
///
/// - `"unchanged"`
/// - `{"replace": <value>}`
/// - `{"object": {"removed": [...], "changed": {key: <diff>}}}`
/// - `{"array": [<op>, ...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diff {
    Unchanged,
    Replace(Value),
    Object(ObjectDiff),
    Array(Vec<ArrayOp>),
}

/// Per-key edits of an object.
///
/// A key present in `changed` but missing from the patched object must carry
/// a `Replace` diff: that is an insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDiff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changed: BTreeMap<String, Diff>,
}

impl Diff {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Diff::Unchanged)
    }

    /// The JSON form stored in version history.
    pub fn to_value(&self) -> Value {
        // Diff only holds strings, maps, sequences and JSON values
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(value: &Value) -> Result<Self, DiffError> {
        Diff::deserialize(value).map_err(|e| DiffError::Mismatch(format!("invalid diff: {}", e)))
    }
}

/// Compute the diff that turns `source` into `target`.
pub(crate) fn diff_values(target: &Value, source: &Value) -> Diff {
    if target == source {
        return Diff::Unchanged;
    }

    match (target, source) {
        (Value::Object(target), Value::Object(source)) => Diff::Object(diff_objects(target, source)),
        (Value::Array(target), Value::Array(source)) => Diff::Array(diff_arrays(target, source)),
        _ => Diff::Replace(target.clone()),
    }
}

fn diff_objects(target: &Map<String, Value>, source: &Map<String, Value>) -> ObjectDiff {
    let removed = source
        .keys()
        .filter(|key| !target.contains_key(*key))
        .cloned()
        .collect();

    let mut changed = BTreeMap::new();
    for (key, value) in target {
        let edit = match source.get(key) {
            Some(old) => diff_values(value, old),
            None => Diff::Replace(value.clone()),
        };
        if !edit.is_unchanged() {
            changed.insert(key.clone(), edit);
        }
    }

    ObjectDiff { removed, changed }
}

/// Apply `diff` to `value`, returning the reconstructed value.
pub(crate) fn patch_value(value: &Value, diff: &Diff) -> Result<Value, DiffError> {
    match diff {
        Diff::Unchanged => Ok(value.clone()),
        Diff::Replace(replacement) => Ok(replacement.clone()),
        Diff::Object(edits) => match value {
            Value::Object(map) => patch_object(map, edits).map(Value::Object),
            other => Err(DiffError::Mismatch(format!(
                "object diff applied to {}",
                kind_of(other)
            ))),
        },
        Diff::Array(ops) => match value {
            Value::Array(items) => patch_array(items, ops).map(Value::Array),
            other => Err(DiffError::Mismatch(format!(
                "array diff applied to {}",
                kind_of(other)
            ))),
        },
    }
}

fn patch_object(map: &Map<String, Value>, edits: &ObjectDiff) -> Result<Map<String, Value>, DiffError> {
    let mut patched = map.clone();

    for key in &edits.removed {
        if patched.remove(key).is_none() {
            return Err(DiffError::Mismatch(format!("cannot remove missing key `{}`", key)));
        }
    }

    for (key, edit) in &edits.changed {
        let next = match (patched.get(key), edit) {
            (Some(current), edit) => patch_value(current, edit)?,
            (None, Diff::Replace(value)) => value.clone(),
            (None, _) => {
                return Err(DiffError::Mismatch(format!(
                    "nested diff targets missing key `{}`",
                    key
                )))
            }
        };
        patched.insert(key.clone(), next);
    }

    Ok(patched)
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
