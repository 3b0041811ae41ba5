use std::fmt;

/// Errors produced by the diff/patch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// A text input could not be parsed as JSON.
    MalformedInput(String),
    /// A diff does not fit the value it is being applied to.
    Mismatch(String),
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffError::MalformedInput(msg) => write!(f, "malformed JSON input: {}", msg),
            DiffError::Mismatch(msg) => write!(f, "diff does not apply: {}", msg),
        }
    }
}

impl std::error::Error for DiffError {}

impl From<serde_json::Error> for DiffError {
    fn from(err: serde_json::Error) -> Self {
        DiffError::MalformedInput(err.to_string())
    }
}
