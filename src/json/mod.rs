//! JSON diff/patch engine.
//!
//! [`diff`] computes a structural edit script between two JSON values and
//! [`patch`] applies it. The convention is fixed: `diff(target, source)` is
//! the script that turns `source` back into `target`, so for any values
//! `old` and `new`:
//!
//! ```ignore
//! let d = diff(&old, &new)?;
//! assert_eq!(patch(&new, &d)?, old);
//! ```
//!
//! Objects are diffed key by key, arrays with an LCS edit script (see the
//! `array` module), everything else is replaced whole.

mod array;
mod diff;
mod error;
mod input;

pub use array::ArrayOp;
pub use diff::{Diff, ObjectDiff};
pub use error::DiffError;
pub use input::JsonInput;

use serde_json::Value;

/// The diff that turns `source` into `target`.
///
/// Either side may be a [`Value`] or JSON text.
pub fn diff<T: JsonInput, S: JsonInput>(target: T, source: S) -> Result<Diff, DiffError> {
    let target = target.to_json()?;
    let source = source.to_json()?;
    Ok(diff::diff_values(&target, &source))
}

/// Apply `diff` to `value` and return the result. `value` is not modified.
pub fn patch<V: JsonInput>(value: V, diff: &Diff) -> Result<Value, DiffError> {
    let value = value.to_json()?;
    diff::patch_value(&value, diff)
}
