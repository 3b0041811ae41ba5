//! Diff history: the `_version_hist` field of versioned records.
//!
//! History is a flat list of `[diff, timestamp]` pairs, newest first. Each
//! diff turns the version after it back into the version before it, so the
//! list can be walked from the current value backwards without storing any
//! full snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json::{self, Diff, DiffError};
use crate::timestamp::Timestamp;

/// One step back in time.
///
/// Serializes as a two-element array `[diff, "UTC:..."]`; the timestamp is
/// the moment the older version was superseded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry(pub Diff, pub Option<Timestamp>);

impl HistoryEntry {
    pub fn diff(&self) -> &Diff {
        &self.0
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.1
    }
}

/// Prepend `diff`, stamped now.
pub fn append_history(diff: Diff, history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    append_history_at(diff, Timestamp::now(), history)
}

/// Prepend `diff` with an explicit timestamp.
pub fn append_history_at(
    diff: Diff,
    at: Timestamp,
    history: Vec<HistoryEntry>,
) -> Vec<HistoryEntry> {
    let mut updated = Vec::with_capacity(history.len() + 1);
    updated.push(HistoryEntry(diff, Some(at)));
    updated.extend(history);
    updated
}

/// Walk history backwards from `current`.
///
/// Yields `(current, None)` first, then every older version paired with the
/// time it was superseded. Calling again restarts the walk.
pub fn parse_history<'a>(current: Value, history: &'a [HistoryEntry]) -> HistoryIter<'a> {
    HistoryIter {
        next: Some(current),
        entries: history.iter(),
        started: false,
    }
}

/// Lazy iterator returned by [`parse_history`].
pub struct HistoryIter<'a> {
    next: Option<Value>,
    entries: std::slice::Iter<'a, HistoryEntry>,
    started: bool,
}

impl Iterator for HistoryIter<'_> {
    type Item = Result<(Value, Option<Timestamp>), DiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return self.next.clone().map(|value| Ok((value, None)));
        }

        let entry = self.entries.next()?;
        let newer = self.next.take()?;
        match json::patch(&newer, entry.diff()) {
            Ok(older) => {
                self.next = Some(older.clone());
                Some(Ok((older, entry.timestamp())))
            }
            Err(err) => Some(Err(err)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.next.is_none() {
            return (0, Some(0));
        }
        let remaining = self.entries.len() + usize::from(!self.started);
        (0, Some(remaining))
    }
}

/// Encode history as the `_version_hist` wire value.
pub fn encode_history(history: &[HistoryEntry]) -> Value {
    Value::Array(
        history
            .iter()
            .map(|entry| {
                let stamp = entry
                    .timestamp()
                    .map(|t| Value::String(t.to_string()))
                    .unwrap_or(Value::Null);
                Value::Array(vec![entry.diff().to_value(), stamp])
            })
            .collect(),
    )
}

/// Decode a `_version_hist` wire value. `null` decodes as empty history.
pub fn decode_history(value: &Value) -> Result<Vec<HistoryEntry>, DiffError> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => Vec::<HistoryEntry>::deserialize(other)
            .map_err(|e| DiffError::Mismatch(format!("invalid version history: {}", e))),
    }
}
