//! Relational repository over the shared SQLite connection.
//!
//! # Responsibility
//! - Translate repository operations into statements on `ConnectionManager`.
//! - Keep SQL text inside the persistence boundary.
//!
//! # Invariants
//! - Writes validate the record before any statement runs.
//! - Reads select only `id` and declared columns, in declaration order.
//! - `get_page` and `count` share `build_filter_clause`.

use crate::db::schema::quote_ident;
use crate::db::{ConnectionManager, StorageError};
use crate::model::kind::RecordKind;
use crate::model::record::{Record, RecordId, ID_FIELD};
use crate::model::value::FieldValue;
use crate::repo::query::build_filter_clause;
use crate::repo::record_repo::{ListQuery, PageRequest, PredicateSet, RepoResult, Repository};
use log::debug;

/// SQLite-backed repository for one record kind.
///
/// Borrows the connection manager, so any number of repositories can share
/// the one live connection.
pub struct SqliteRepository<'conn> {
    db: &'conn ConnectionManager,
    kind: RecordKind,
    table: String,
    select_columns: String,
}

impl<'conn> SqliteRepository<'conn> {
    /// Builds a repository and runs the additive schema check for `kind`.
    pub fn try_new(db: &'conn ConnectionManager, kind: RecordKind) -> RepoResult<Self> {
        db.ensure_table(&kind)?;

        let select_columns = std::iter::once(ID_FIELD)
            .chain(kind.field_names())
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            db,
            table: quote_ident(kind.name()),
            kind,
            select_columns,
        })
    }
}

impl Repository for SqliteRepository<'_> {
    fn kind(&self) -> &RecordKind {
        &self.kind
    }

    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<Record>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?;",
            self.select_columns,
            self.table,
            quote_ident(ID_FIELD)
        );
        let mut rows = self.db.execute_query(&sql, &[FieldValue::Integer(id)])?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    fn get_page(&self, page: PageRequest, query: &ListQuery) -> RepoResult<Vec<Record>> {
        let clause = build_filter_clause(&self.kind, &query.predicates, query.sort_by.as_deref())?;
        let sql = format!(
            "SELECT {} FROM {}{}{} LIMIT ? OFFSET ?;",
            self.select_columns, self.table, clause.where_sql, clause.order_sql
        );

        let mut binds = clause.binds;
        binds.push(FieldValue::Integer(i64::from(page.size())));
        binds.push(FieldValue::Integer(offset_to_sql(page.offset())?));

        Ok(self.db.execute_query(&sql, &binds)?)
    }

    fn count(&self, predicates: &PredicateSet) -> RepoResult<u64> {
        let clause = build_filter_clause(&self.kind, predicates, None)?;
        let sql = format!(
            "SELECT COUNT(*) AS count FROM {}{};",
            self.table, clause.where_sql
        );

        let rows = self.db.execute_query(&sql, &clause.binds)?;
        let count = rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(FieldValue::as_integer)
            .ok_or_else(|| StorageError::InvalidData("COUNT(*) returned no integer".to_string()))?;
        u64::try_from(count)
            .map_err(|_| StorageError::InvalidData(format!("negative row count {count}")).into())
    }

    fn add(&self, record: &Record) -> RepoResult<RecordId> {
        self.kind.validate_new(record)?;
        let normalized = self.kind.normalize(record);

        let columns: Vec<String> = self.kind.field_names().map(quote_ident).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES;", self.table)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({placeholders});",
                self.table,
                columns.join(", ")
            )
        };

        let outcome = self.db.execute_write(&sql, &self.bind_fields(&normalized))?;
        let id = outcome
            .inserted_id
            .ok_or_else(|| StorageError::InvalidData("insert produced no row id".to_string()))?;
        debug!(
            "event=repo_write module=repo status=ok op=add backend=sqlite kind={} id={}",
            self.kind.name(),
            id
        );
        Ok(id)
    }

    fn update(&self, id: RecordId, record: &Record) -> RepoResult<bool> {
        self.kind.validate_replacement(id, record)?;
        if self.kind.fields().is_empty() {
            return Ok(self.get_by_id(id)?.is_some());
        }
        let normalized = self.kind.normalize(record);

        let assignments = self
            .kind
            .field_names()
            .map(|name| format!("{} = ?", quote_ident(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?;",
            self.table,
            quote_ident(ID_FIELD)
        );

        let mut binds = self.bind_fields(&normalized);
        binds.push(FieldValue::Integer(id));
        let outcome = self.db.execute_write(&sql, &binds)?;
        debug!(
            "event=repo_write module=repo status=ok op=update backend=sqlite kind={} id={} rows_affected={}",
            self.kind.name(),
            id,
            outcome.rows_affected
        );
        Ok(outcome.rows_affected > 0)
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?;",
            self.table,
            quote_ident(ID_FIELD)
        );
        let outcome = self.db.execute_write(&sql, &[FieldValue::Integer(id)])?;
        debug!(
            "event=repo_write module=repo status=ok op=delete backend=sqlite kind={} id={} rows_affected={}",
            self.kind.name(),
            id,
            outcome.rows_affected
        );
        Ok(outcome.rows_affected > 0)
    }
}

impl SqliteRepository<'_> {
    fn bind_fields(&self, normalized: &Record) -> Vec<FieldValue> {
        self.kind
            .field_names()
            .map(|name| normalized.value_or_null(name))
            .collect()
    }
}

fn offset_to_sql(offset: u64) -> RepoResult<i64> {
    i64::try_from(offset)
        .map_err(|_| StorageError::InvalidData(format!("page offset {offset} overflows")).into())
}
