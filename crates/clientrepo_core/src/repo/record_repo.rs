//! Generic record repository contract.
//!
//! # Responsibility
//! - Define the storage-agnostic CRUD + pagination + count contract.
//! - Define the query inputs shared by every backend.
//!
//! # Invariants
//! - Writes validate against the record kind before touching storage.
//! - `update` and `delete` on an unknown id are no-ops, not errors.
//! - Zero results are never an error.

use crate::db::StorageError;
use crate::model::kind::{RecordKind, ValidationError};
use crate::model::record::{Record, RecordId};
use crate::model::value::FieldValue;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Storage(StorageError),
    NotFound(RecordId),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Sqlite(value))
    }
}

/// "Page `k` of size `n`", 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Rejects `page == 0` and `size == 0`.
    pub fn new(page: u32, size: u32) -> Result<Self, ValidationError> {
        if page == 0 || size == 0 {
            return Err(ValidationError::InvalidPage { page, size });
        }
        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// `(page - 1) * size`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

/// Exact-match filter conditions, ANDed together. Empty means no filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    conditions: BTreeMap<String, FieldValue>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the condition `field = value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Conditions in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.conditions
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Whether `record` satisfies every condition.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| record.value_or_null(field).matches(expected))
    }
}

/// Filter plus optional ascending single-field sort for `get_page`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub predicates: PredicateSet,
    pub sort_by: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.predicates = self.predicates.eq(field, value);
        self
    }

    pub fn with_predicates(mut self, predicates: PredicateSet) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }
}

/// Storage-agnostic repository over records of one kind.
///
/// `update` always overwrites the full field set: fields missing from the
/// supplied record become `Null`. `update` and `delete` return whether a
/// stored record was changed; `false` means the id did not exist.
pub trait Repository {
    fn kind(&self) -> &RecordKind;
    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<Record>>;
    fn get_page(&self, page: PageRequest, query: &ListQuery) -> RepoResult<Vec<Record>>;
    fn count(&self, predicates: &PredicateSet) -> RepoResult<u64>;
    fn add(&self, record: &Record) -> RepoResult<RecordId>;
    fn update(&self, id: RecordId, record: &Record) -> RepoResult<bool>;
    fn delete(&self, id: RecordId) -> RepoResult<bool>;
}

impl<R: Repository + ?Sized> Repository for Box<R> {
    fn kind(&self) -> &RecordKind {
        (**self).kind()
    }

    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<Record>> {
        (**self).get_by_id(id)
    }

    fn get_page(&self, page: PageRequest, query: &ListQuery) -> RepoResult<Vec<Record>> {
        (**self).get_page(page, query)
    }

    fn count(&self, predicates: &PredicateSet) -> RepoResult<u64> {
        (**self).count(predicates)
    }

    fn add(&self, record: &Record) -> RepoResult<RecordId> {
        (**self).add(record)
    }

    fn update(&self, id: RecordId, record: &Record) -> RepoResult<bool> {
        (**self).update(id, record)
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        (**self).delete(id)
    }
}

impl<R: Repository + ?Sized> Repository for &R {
    fn kind(&self) -> &RecordKind {
        (**self).kind()
    }

    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<Record>> {
        (**self).get_by_id(id)
    }

    fn get_page(&self, page: PageRequest, query: &ListQuery) -> RepoResult<Vec<Record>> {
        (**self).get_page(page, query)
    }

    fn count(&self, predicates: &PredicateSet) -> RepoResult<u64> {
        (**self).count(predicates)
    }

    fn add(&self, record: &Record) -> RepoResult<RecordId> {
        (**self).add(record)
    }

    fn update(&self, id: RecordId, record: &Record) -> RepoResult<bool> {
        (**self).update(id, record)
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        (**self).delete(id)
    }
}
