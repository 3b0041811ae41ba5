use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{Backend, InMemoryBackend, JournalBackend};
use crate::error::StoreError;

/// Driver-specific connection parameters.
pub type DriverParams = BTreeMap<String, String>;

/// Serializable form of a backend configuration:
/// `{"driver": "sqlite", "params": {"filename": "app.db"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub driver: String,
    #[serde(default)]
    pub params: DriverParams,
}

impl DatabaseConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        DatabaseConfig {
            driver: driver.into(),
            params: DriverParams::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A backend configuration bound to a live driver.
///
/// Clones share the driver. Two `Database` values compare equal only when
/// they share the same driver instance.
#[derive(Clone)]
pub struct Database {
    driver: String,
    params: DriverParams,
    backend: Arc<dyn Backend>,
}

impl Database {
    /// Instantiate the driver named by `config.driver`.
    pub fn open(config: DatabaseConfig) -> Result<Self, StoreError> {
        let backend: Arc<dyn Backend> = match config.driver.as_str() {
            InMemoryBackend::DRIVER => Arc::new(InMemoryBackend::new()),
            JournalBackend::DRIVER => Arc::new(JournalBackend::new()),
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let filename = config.params.get("filename").ok_or_else(|| {
                    StoreError::Config("sqlite backend requires a `filename` parameter".to_string())
                })?;
                Arc::new(crate::backend::SqliteBackend::open(filename)?)
            }
            other => return Err(StoreError::UnknownDriver(other.to_string())),
        };

        log::debug!("opened {} database", config.driver);
        Ok(Database {
            driver: config.driver,
            params: config.params,
            backend,
        })
    }

    /// Shorthand for [`Database::open`] from a driver kind and parameters.
    pub fn new<I, K, V>(driver: &str, params: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Database::open(DatabaseConfig {
            driver: driver.to_string(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        })
    }

    /// Wrap a driver built elsewhere, for backends this crate does not ship.
    pub fn with_backend<B: Backend + 'static>(backend: B, params: DriverParams) -> Self {
        Database {
            driver: backend.driver().to_string(),
            params,
            backend: Arc::new(backend),
        }
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn params(&self) -> &DriverParams {
        &self.params
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

impl PartialEq for Database {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }
}

impl Eq for Database {}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("driver", &self.driver)
            .field("params", &self.params)
            .finish()
    }
}
