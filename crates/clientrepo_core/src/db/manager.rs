//! Single-owner SQLite connection with query/write primitives.
//!
//! # Responsibility
//! - Hold the one live connection shared by every relational repository.
//! - Run read queries into records and write statements with auto-commit.
//! - Release the connection exactly once (explicit `close` or drop).
//!
//! # Invariants
//! - Statements are serialized through a mutex around the handle.
//! - After release every primitive fails with `StorageError::Closed`.

use super::open::{open_file, open_memory};
use super::schema;
use super::{StorageError, StorageResult};
use crate::model::kind::RecordKind;
use crate::model::record::{Record, RecordId};
use crate::model::value::FieldValue;
use log::{debug, error, info};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Result of one write statement.
///
/// `inserted_id` is `Some` only for an `INSERT` that stored a row;
/// `UPDATE` and `DELETE` always report `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub rows_affected: usize,
    pub inserted_id: Option<RecordId>,
}

/// Owner of the process' storage connection.
///
/// Construct it once at startup and lend it to repositories by reference;
/// every repository built from the same manager shares one connection.
pub struct ConnectionManager {
    conn: Mutex<Option<Connection>>,
    mode: &'static str,
}

impl ConnectionManager {
    /// Opens (or creates) a SQLite database file.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_file(path.as_ref())?, "file"))
    }

    /// Opens a private in-memory database, mostly for tests.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_memory()?, "memory"))
    }

    fn from_connection(conn: Connection, mode: &'static str) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            mode,
        }
    }

    /// Runs a read-only statement and returns every row as a record keyed by
    /// column name. `params` bind positionally.
    pub fn execute_query(&self, sql: &str, params: &[FieldValue]) -> StorageResult<Vec<Record>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();

            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Record::new();
                for (index, column) in columns.iter().enumerate() {
                    record.set(column.as_str(), read_value(row.get_ref(index)?, column)?);
                }
                records.push(record);
            }

            Ok(records)
        })
    }

    /// Runs an insert/update/delete statement. SQLite auto-commit makes the
    /// change durable before this returns.
    pub fn execute_write(&self, sql: &str, params: &[FieldValue]) -> StorageResult<WriteOutcome> {
        self.with_connection(|conn| {
            let rows_affected = conn.execute(sql, params_from_iter(params.iter()))?;
            let inserted_id =
                (is_insert_statement(sql) && rows_affected > 0).then(|| conn.last_insert_rowid());
            debug!(
                "event=db_write module=db status=ok rows_affected={} inserted_id={}",
                rows_affected,
                inserted_id.map_or_else(|| "none".to_string(), |id| id.to_string())
            );
            Ok(WriteOutcome {
                rows_affected,
                inserted_id,
            })
        })
    }

    /// Creates the kind's table when missing and adds any missing declared
    /// columns. Returns the names of the columns that were added.
    pub fn ensure_table(&self, kind: &RecordKind) -> StorageResult<Vec<String>> {
        self.with_connection(|conn| schema::ensure_table(conn, kind))
    }

    /// Releases the connection. Calling it again is a no-op.
    pub fn close(&self) -> StorageResult<()> {
        let mut guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(conn) = guard.take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=db status=ok mode={}", self.mode);
                Ok(())
            }
            // The handle returned with the error is dropped here, which still
            // releases it; the manager stays closed either way.
            Err((_conn, err)) => {
                error!(
                    "event=db_close module=db status=error mode={} error={}",
                    self.mode, err
                );
                Err(err.into())
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// `file` or `memory`.
    pub fn mode(&self) -> &'static str {
        self.mode
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let guard = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let conn = guard.as_ref().ok_or(StorageError::Closed)?;
        op(conn)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        // close() logs its own failure.
        let _ = self.close();
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Self::Null => ValueRef::Null,
            Self::Integer(number) => ValueRef::Integer(*number),
            Self::Real(number) => ValueRef::Real(*number),
            Self::Text(text) => ValueRef::Text(text.as_bytes()),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

fn read_value(value: ValueRef<'_>, column: &str) -> StorageResult<FieldValue> {
    match value {
        ValueRef::Null => Ok(FieldValue::Null),
        ValueRef::Integer(number) => Ok(FieldValue::Integer(number)),
        ValueRef::Real(number) => Ok(FieldValue::Real(number)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| FieldValue::Text(text.to_string()))
            .map_err(|_| StorageError::InvalidData(format!("non UTF-8 text in column `{column}`"))),
        ValueRef::Blob(_) => Err(StorageError::InvalidData(format!(
            "blob value in column `{column}` is not a supported scalar"
        ))),
    }
}

fn is_insert_statement(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("insert"))
}

#[cfg(test)]
mod tests {
    use super::is_insert_statement;

    #[test]
    fn insert_detection_ignores_case_and_leading_whitespace() {
        assert!(is_insert_statement("INSERT INTO client (name) VALUES (?)"));
        assert!(is_insert_statement("\n   insert into client DEFAULT VALUES"));
        assert!(!is_insert_statement("UPDATE client SET name = ?"));
        assert!(!is_insert_statement("DELETE"));
    }
}
