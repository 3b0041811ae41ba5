//! Export every record of selected types to JSON-lines files.
//!
//! ```ignore
//! let mut backup = Backup::new(mapping::global());
//! backup.add_type::<Person>()?;
//! backup.add_type::<AuditEntry>()?;
//! let mut report = backup.run("/var/backups/app")?;
//! records::<BackupReport>().save(&mut report)?;
//! ```
//!
//! Each type gets one file, `<TypeName>_<table>.json`, holding one
//! serialized record per line. Reports still key types by their backup
//! name, `<TypeName>:<table>`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::mapping::DatabaseMapping;
use crate::record::{Record, Storable};
use crate::repository::RecordsExt;
use crate::timestamp::Timestamp;

type Exporter = Box<dyn Fn(&DatabaseMapping) -> Result<Vec<String>, StoreError> + Send + Sync>;

/// Outcome of one backup run. Storable, so runs can be kept as history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupReport {
    pub name: String,
    pub started: Option<Timestamp>,
    /// Records written, per backup name.
    pub class_instance_stats: BTreeMap<String, usize>,
    pub backup_log: Vec<String>,
}

impl Storable for BackupReport {
    const TABLE_NAME: &'static str = "BackupHistory";
}

impl BackupReport {
    fn log(&mut self, entry: String) {
        log::info!("{}", entry);
        self.backup_log.push(entry);
    }
}

pub struct Backup<'a> {
    mapping: &'a DatabaseMapping,
    name: String,
    types: BTreeMap<String, Exporter>,
}

impl<'a> Backup<'a> {
    pub fn new(mapping: &'a DatabaseMapping) -> Self {
        Backup {
            mapping,
            name: "backup".to_string(),
            types: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether `T` resolves to some database and can therefore be backed up.
    pub fn is_backup_type<T: Storable>(&self) -> Result<bool, StoreError> {
        Ok(self.mapping.resolve_or_none::<T>()?.is_some())
    }

    /// Include every record of `T` in the backup.
    pub fn add_type<T: Storable>(&mut self) -> Result<(), StoreError> {
        if !self.is_backup_type::<T>()? {
            return Err(StoreError::NoMapping {
                type_name: T::type_key().name().to_string(),
            });
        }

        let exporter: Exporter = Box::new(|mapping: &DatabaseMapping| {
            let records: Vec<Record<T>> = mapping.records::<T>().find_all()?;
            records
                .into_iter()
                .map(|mut record| record.to_data())
                .collect::<Result<Vec<String>, StoreError>>()
        });
        self.types.insert(backup_name::<T>(), exporter);
        Ok(())
    }

    /// Backup names of the registered types, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Write one file per registered type into `dir`, creating it if needed.
    pub fn run(&self, dir: impl AsRef<Path>) -> Result<BackupReport, StoreError> {
        let dir = dir.as_ref();
        let mut report = BackupReport {
            name: self.name.clone(),
            started: Some(Timestamp::now()),
            ..Default::default()
        };
        report.log("Starting backup".to_string());
        fs::create_dir_all(dir)?;

        for (name, export) in &self.types {
            report.log(format!("Backing up {}", name));
            let lines = export(self.mapping)?;

            let mut out = BufWriter::new(File::create(dir.join(backup_file_name(name)))?);
            for line in &lines {
                out.write_all(line.as_bytes())?;
                out.write_all(b"\n")?;
            }
            out.flush()?;

            report.class_instance_stats.insert(name.clone(), lines.len());
            report.log(format!("{} => {} records backed up", name, lines.len()));
        }

        report.log("Backup completed".to_string());
        Ok(report)
    }
}

/// `<TypeName>:<table>`, using the type's name without its module path.
pub fn backup_name<T: Storable>() -> String {
    let full = T::type_key().name();
    let short = full.rsplit("::").next().unwrap_or(full);
    format!("{}:{}", short, T::TABLE_NAME)
}

/// File name for a backup name. Characters that some filesystems reject,
/// such as the `:` separator, become `_`.
pub fn backup_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| match c {
            ':' | '<' | '>' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}.json", safe)
}
