//! SQLite driver (`sqlite`).
//!
//! One table per record type: `(id text primary key, value text, <index>
//! text, ...)` plus one SQL index per declared index. Index columns hold the
//! canonical JSON text of the index value, so lookups compare exactly,
//! including type (`"1"` and `1` are different).
//!
//! Table and column names are always double-quoted in generated SQL, so a
//! record type named after a keyword (`Order`, `Group`) is an ordinary table.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;

use super::{require_id, Backend, StoredRecord, TableSchema};
use crate::error::StoreError;

const DRIVER: &str = "sqlite";

/// SQLite-backed driver.
///
/// The connection sits behind a mutex, so one backend can be shared across
/// threads; statements are serialized.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) a database file. `":memory:"` gives a private
    /// in-memory database.
    pub fn open(filename: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = filename.as_ref();
        let conn = Connection::open(path).map_err(|e| StoreError::Config(format!(
            "cannot open sqlite database {}: {}",
            path.display(),
            e
        )))?;
        log::debug!("opened sqlite database {}", path.display());
        Ok(SqliteBackend {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::LockPoisoned("sqlite connection"))
    }

    fn select(
        &self,
        schema: &TableSchema,
        filter: Option<(&str, String)>,
        operation: &'static str,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        check_schema(schema)?;
        let mut sql = format!("select {} from {}", column_list(schema), quote(&schema.table));
        let mut args = Vec::new();
        if let Some((column, arg)) = filter {
            sql.push_str(&format!(" where {} = ?1", quote(column)));
            args.push(arg);
        }

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| backend_error(operation, schema, e))?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| read_row(row, schema))
            .map_err(|e| backend_error(operation, schema, e))?;

        let mut found = Vec::new();
        for row in rows {
            let raw = row.map_err(|e| backend_error(operation, schema, e))?;
            found.push(raw.into_record(schema)?);
        }
        Ok(found)
    }
}

/// Row as read from SQL, before index text is parsed back into JSON.
struct RawRow {
    id: String,
    data: String,
    indexes: Vec<Option<String>>,
}

impl RawRow {
    fn into_record(self, schema: &TableSchema) -> Result<StoredRecord, StoreError> {
        let mut indexes = std::collections::BTreeMap::new();
        for (name, text) in schema.index_names.iter().zip(self.indexes) {
            if let Some(text) = text {
                indexes.insert(name.clone(), serde_json::from_str(&text)?);
            }
        }
        Ok(StoredRecord {
            id: self.id,
            data: self.data,
            indexes,
        })
    }
}

fn read_row(row: &rusqlite::Row<'_>, schema: &TableSchema) -> rusqlite::Result<RawRow> {
    let mut indexes = Vec::with_capacity(schema.index_names.len());
    for position in 0..schema.index_names.len() {
        indexes.push(row.get::<_, Option<String>>(position + 2)?);
    }
    Ok(RawRow {
        id: row.get(0)?,
        data: row.get(1)?,
        indexes,
    })
}

fn columns(schema: &TableSchema) -> Vec<&str> {
    let mut cols = vec!["id", "value"];
    cols.extend(schema.index_names.iter().map(String::as_str));
    cols
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

fn column_list(schema: &TableSchema) -> String {
    columns(schema)
        .into_iter()
        .map(quote)
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Table and index names are spliced into SQL (quoted), so only plain
/// identifiers are allowed.
fn check_schema(schema: &TableSchema) -> Result<(), StoreError> {
    if !is_identifier(&schema.table) {
        return Err(StoreError::Config(format!(
            "{:?} is not a valid sqlite table name",
            schema.table
        )));
    }
    for name in &schema.index_names {
        if !is_identifier(name) || name == "id" || name == "value" {
            return Err(StoreError::Config(format!(
                "{:?} is not a valid index name for sqlite table {}",
                name, schema.table
            )));
        }
    }
    Ok(())
}

fn backend_error(operation: &'static str, schema: &TableSchema, err: rusqlite::Error) -> StoreError {
    let message = err.to_string();
    if message.contains("no such table") {
        return StoreError::MissingTable {
            driver: DRIVER.to_string(),
            table: schema.table.clone(),
        };
    }
    StoreError::Backend {
        operation,
        table: schema.table.clone(),
        message,
    }
}

impl Backend for SqliteBackend {
    fn driver(&self) -> &str {
        DRIVER
    }

    fn ensure_table(&self, schema: &TableSchema) -> Result<(), StoreError> {
        check_schema(schema)?;
        let table = quote(&schema.table);
        let mut cols = vec![
            format!("{} text primary key", quote("id")),
            format!("{} text not null", quote("value")),
        ];
        cols.extend(schema.index_names.iter().map(|name| format!("{} text", quote(name))));

        let mut sql = format!("create table if not exists {} ({});", table, cols.join(", "));
        for name in &schema.index_names {
            sql.push_str(&format!(
                "\ncreate index if not exists {index} on {table}({column});",
                index = quote(&format!("{}_{}_idx", schema.table, name)),
                table = table,
                column = quote(name)
            ));
        }

        self.conn()?
            .execute_batch(&sql)
            .map_err(|e| backend_error("ensure_table", schema, e))
    }

    fn find_one(&self, schema: &TableSchema, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        check_schema(schema)?;
        let sql = format!(
            "select {} from {} where \"id\" = ?1",
            column_list(schema),
            quote(&schema.table)
        );
        let raw = self
            .conn()?
            .query_row(&sql, params![id], |row| read_row(row, schema))
            .optional()
            .map_err(|e| backend_error("find_one", schema, e))?;
        raw.map(|raw| raw.into_record(schema)).transpose()
    }

    fn find_all(&self, schema: &TableSchema) -> Result<Vec<StoredRecord>, StoreError> {
        self.select(schema, None, "find_all")
    }

    fn find_by_index(
        &self,
        schema: &TableSchema,
        index_name: &str,
        value: &Value,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        schema.check_index(index_name)?;
        let key = serde_json::to_string(value)?;
        self.select(schema, Some((index_name, key)), "find_by_index")
    }

    fn save(&self, schema: &TableSchema, record: &StoredRecord) -> Result<(), StoreError> {
        require_id(schema, record)?;
        check_schema(schema)?;

        let holders: Vec<String> = (1..=columns(schema).len())
            .map(|n| format!("?{}", n))
            .collect();
        let sql = format!(
            "insert or replace into {} ({}) values ({})",
            quote(&schema.table),
            column_list(schema),
            holders.join(", ")
        );

        let mut values: Vec<Option<String>> = vec![Some(record.id.clone()), Some(record.data.clone())];
        for name in &schema.index_names {
            let text = match record.index(name) {
                Some(value) => Some(serde_json::to_string(value)?),
                None => None,
            };
            values.push(text);
        }

        self.conn()?
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(|e| backend_error("save", schema, e))?;
        Ok(())
    }

    fn delete(&self, schema: &TableSchema, id: &str) -> Result<(), StoreError> {
        check_schema(schema)?;
        let sql = format!("delete from {} where \"id\" = ?1", quote(&schema.table));
        self.conn()?
            .execute(&sql, params![id])
            .map_err(|e| backend_error("delete", schema, e))?;
        Ok(())
    }
}
