use std::fmt;

use crate::json::DiffError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No explicit mapping in the type's lineage and no default database.
    NoMapping { type_name: String },
    /// The backend keeps every write forever.
    DeleteNotSupported { driver: String, table: String },
    /// The record type declares a versioning tag nobody understands.
    InvalidVersioningMode { type_name: String, mode: String },
    /// Declared parents cannot be linearized.
    InconsistentHierarchy { type_name: String },
    UnknownDriver(String),
    /// Bad or missing driver parameters, bad table or index names.
    Config(String),
    MissingTable { driver: String, table: String },
    UnknownIndex { table: String, index: String },
    /// A stored or in-memory record does not have the expected shape.
    InvalidRecord { table: String, reason: String },
    Serde(String),
    Backend {
        operation: &'static str,
        table: String,
        message: String,
    },
    Diff(DiffError),
    Io(String),
    LockPoisoned(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoMapping { type_name } => {
                write!(f, "there is no database mapping for {}", type_name)
            }
            StoreError::DeleteNotSupported { driver, table } => write!(
                f,
                "the {} backend does not support deleting from {}",
                driver, table
            ),
            StoreError::InvalidVersioningMode { type_name, mode } => {
                write!(f, "{} declares unknown versioning mode {:?}", type_name, mode)
            }
            StoreError::InconsistentHierarchy { type_name } => write!(
                f,
                "cannot compute a consistent ancestor order for {}",
                type_name
            ),
            StoreError::UnknownDriver(driver) => write!(f, "unknown database driver {:?}", driver),
            StoreError::Config(message) => write!(f, "configuration error: {}", message),
            StoreError::MissingTable { driver, table } => {
                write!(f, "table {} does not exist in the {} backend", table, driver)
            }
            StoreError::UnknownIndex { table, index } => {
                write!(f, "table {} has no index named {}", table, index)
            }
            StoreError::InvalidRecord { table, reason } => {
                write!(f, "invalid record for {}: {}", table, reason)
            }
            StoreError::Serde(message) => write!(f, "record serialization error: {}", message),
            StoreError::Backend {
                operation,
                table,
                message,
            } => write!(f, "{} on {} failed: {}", operation, table, message),
            StoreError::Diff(err) => write!(f, "version history error: {}", err),
            StoreError::Io(message) => write!(f, "i/o error: {}", message),
            StoreError::LockPoisoned(operation) => {
                write!(f, "lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Diff(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DiffError> for StoreError {
    fn from(err: DiffError) -> Self {
        StoreError::Diff(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
