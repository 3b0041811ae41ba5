use std::borrow::Cow;

use serde_json::Value;

use super::DiffError;

/// Anything that can be fed to [`diff`](super::diff) or [`patch`](super::patch).
///
/// In-memory values are borrowed as they are. Text is parsed as JSON first,
/// so `"{\"a\": 1}"` and `json!({"a": 1})` are interchangeable inputs.
pub trait JsonInput {
    fn to_json(&self) -> Result<Cow<'_, Value>, DiffError>;
}

impl JsonInput for Value {
    fn to_json(&self) -> Result<Cow<'_, Value>, DiffError> {
        Ok(Cow::Borrowed(self))
    }
}

impl JsonInput for &Value {
    fn to_json(&self) -> Result<Cow<'_, Value>, DiffError> {
        Ok(Cow::Borrowed(*self))
    }
}

impl JsonInput for &str {
    fn to_json(&self) -> Result<Cow<'_, Value>, DiffError> {
        parse_text(self)
    }
}

impl JsonInput for String {
    fn to_json(&self) -> Result<Cow<'_, Value>, DiffError> {
        parse_text(self)
    }
}

impl JsonInput for &String {
    fn to_json(&self) -> Result<Cow<'_, Value>, DiffError> {
        parse_text(self)
    }
}

fn parse_text(text: &str) -> Result<Cow<'static, Value>, DiffError> {
    let value = serde_json::from_str(text)?;
    Ok(Cow::Owned(value))
}
