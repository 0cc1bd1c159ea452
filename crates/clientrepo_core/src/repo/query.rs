//! Shared predicate-and-order builders.
//!
//! # Responsibility
//! - Translate a predicate set and sort field into SQL clauses and binds.
//! - Apply the same semantics in memory for file-backed collections.
//!
//! # Invariants
//! - `get_page` and `count` of a backend go through the same builder, so
//!   their filtering can never drift apart.
//! - Unknown filter/sort fields are rejected, never silently ignored.
//! - An empty predicate set emits no `WHERE` clause at all.
//! - Sorting is ascending on one field; ties fall back to `id` order.

use crate::db::schema::quote_ident;
use crate::model::kind::{RecordKind, ValidationError};
use crate::model::record::{Record, ID_FIELD};
use crate::model::value::FieldValue;
use crate::repo::record_repo::PredicateSet;
use std::cmp::Ordering;

static NULL_VALUE: FieldValue = FieldValue::Null;

/// SQL fragments produced for one filtered/sorted statement.
///
/// Both fragments are empty or start with a single space, so they can be
/// appended directly after the `FROM` clause.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilterClause {
    pub where_sql: String,
    pub order_sql: String,
    pub binds: Vec<FieldValue>,
}

pub(crate) fn build_filter_clause(
    kind: &RecordKind,
    predicates: &PredicateSet,
    sort_by: Option<&str>,
) -> Result<FilterClause, ValidationError> {
    check_query(kind, predicates, sort_by)?;

    let mut conditions = Vec::with_capacity(predicates.len());
    let mut binds = Vec::with_capacity(predicates.len());
    for (field, value) in predicates.iter() {
        if value.is_null() {
            conditions.push(format!("{} IS NULL", quote_ident(field)));
        } else {
            conditions.push(format!("{} = ?", quote_ident(field)));
            binds.push(value.clone());
        }
    }

    let where_sql = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let order_sql = match sort_by {
        None => String::new(),
        Some(ID_FIELD) => format!(" ORDER BY {} ASC", quote_ident(ID_FIELD)),
        Some(field) => format!(
            " ORDER BY {} ASC, {} ASC",
            quote_ident(field),
            quote_ident(ID_FIELD)
        ),
    };

    Ok(FilterClause {
        where_sql,
        order_sql,
        binds,
    })
}

/// In-memory counterpart of [`build_filter_clause`]: keeps matching records
/// and, when asked, sorts them with the storage ordering of field values.
pub(crate) fn select_matching(
    kind: &RecordKind,
    records: Vec<Record>,
    predicates: &PredicateSet,
    sort_by: Option<&str>,
) -> Result<Vec<Record>, ValidationError> {
    check_query(kind, predicates, sort_by)?;

    let mut selected: Vec<Record> = records
        .into_iter()
        .filter(|record| predicates.matches(record))
        .collect();

    if let Some(field) = sort_by {
        selected.sort_by(|left, right| compare_by_field(left, right, field));
    }

    Ok(selected)
}

/// Ascending order on `field`, ties broken by `id`.
pub(crate) fn compare_by_field(left: &Record, right: &Record, field: &str) -> Ordering {
    let left_value = left.get(field).unwrap_or(&NULL_VALUE);
    let right_value = right.get(field).unwrap_or(&NULL_VALUE);
    left_value
        .storage_cmp(right_value)
        .then_with(|| left.id().cmp(&right.id()))
}

fn check_query(
    kind: &RecordKind,
    predicates: &PredicateSet,
    sort_by: Option<&str>,
) -> Result<(), ValidationError> {
    for (field, value) in predicates.iter() {
        kind.check_predicate(field, value)?;
    }
    if let Some(field) = sort_by {
        kind.check_queryable(field)?;
    }
    Ok(())
}
