//! Additive schema checks for record kinds.
//!
//! # Responsibility
//! - Create a kind's table on first use.
//! - Add declared columns that an older table is missing.
//!
//! # Invariants
//! - Existing columns are never dropped, renamed or retyped.
//! - `id` is always `INTEGER PRIMARY KEY AUTOINCREMENT`, so ids are never reused.

use super::StorageResult;
use crate::model::kind::RecordKind;
use crate::model::record::ID_FIELD;
use log::info;
use rusqlite::Connection;
use std::collections::HashSet;

/// Quotes an identifier for safe interpolation into SQL text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Ensures the table for `kind` exists with every declared column.
///
/// Returns the columns added to an already existing table.
pub(crate) fn ensure_table(conn: &Connection, kind: &RecordKind) -> StorageResult<Vec<String>> {
    let table = quote_ident(kind.name());
    let mut columns = vec![format!(
        "{} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote_ident(ID_FIELD)
    )];
    columns.extend(kind.fields().iter().map(|spec| {
        format!("{} {}", quote_ident(&spec.name), spec.field_type.sql_type())
    }));
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} ({});",
        columns.join(", ")
    ))?;

    let existing = existing_columns(conn, kind.name())?;
    let mut added = Vec::new();
    for spec in kind.fields() {
        if existing.contains(&spec.name) {
            continue;
        }

        conn.execute_batch(&format!(
            "ALTER TABLE {table} ADD COLUMN {} {};",
            quote_ident(&spec.name),
            spec.field_type.sql_type()
        ))?;
        info!(
            "event=schema_add_column module=db status=ok table={} column={}",
            kind.name(),
            spec.name
        );
        added.push(spec.name.clone());
    }

    Ok(added)
}

fn existing_columns(conn: &Connection, table: &str) -> StorageResult<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", quote_ident(table)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}
