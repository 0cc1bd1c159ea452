//! Record use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD/list entry points for UI and HTTP callers.
//! - Notify subscribed listeners after successful mutations.
//! - Reduce listed records to display projections.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Listeners run only after a repository call succeeded and changed a record.
//! - Service layer remains storage-agnostic.

use crate::model::projection::Projection;
use crate::model::record::{Record, RecordId};
use crate::repo::record_repo::{
    ListQuery, PageRequest, PredicateSet, RepoError, RepoResult, Repository,
};
use log::debug;

/// Mutation notification delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Added(RecordId),
    Updated(RecordId),
    Deleted(RecordId),
}

/// Observer of repository mutations, e.g. a table view that must refresh.
pub trait ChangeListener {
    fn on_change(&self, event: &ChangeEvent);
}

impl<F: Fn(&ChangeEvent)> ChangeListener for F {
    fn on_change(&self, event: &ChangeEvent) {
        self(event)
    }
}

/// Use-case service wrapper over any repository backend.
pub struct RecordService<R: Repository> {
    repo: R,
    listeners: Vec<Box<dyn ChangeListener>>,
}

impl<R: Repository> RecordService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            listeners: Vec::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Registers a listener; it is called after every successful mutation.
    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) {
        self.listeners.push(listener);
    }

    pub fn get(&self, id: RecordId) -> RepoResult<Option<Record>> {
        self.repo.get_by_id(id)
    }

    /// Like `get`, but reports an absent record as `RepoError::NotFound`.
    pub fn require(&self, id: RecordId) -> RepoResult<Record> {
        self.repo.get_by_id(id)?.ok_or(RepoError::NotFound(id))
    }

    pub fn page(&self, page: PageRequest, query: &ListQuery) -> RepoResult<Vec<Record>> {
        self.repo.get_page(page, query)
    }

    /// Lists one page reduced to `projection` (e.g. brief id + name rows).
    pub fn page_projected(
        &self,
        page: PageRequest,
        query: &ListQuery,
        projection: &Projection,
    ) -> RepoResult<Vec<Record>> {
        Ok(self
            .repo
            .get_page(page, query)?
            .iter()
            .map(|record| projection.apply(record))
            .collect())
    }

    pub fn count(&self, predicates: &PredicateSet) -> RepoResult<u64> {
        self.repo.count(predicates)
    }

    /// Number of pages of `size` records needed for the matching records.
    ///
    /// Zero matches yield zero pages; `size == 0` is a validation error.
    pub fn page_count(&self, size: u32, predicates: &PredicateSet) -> RepoResult<u64> {
        let first = PageRequest::new(1, size)?;
        let total = self.repo.count(predicates)?;
        Ok(total.div_ceil(u64::from(first.size())))
    }

    pub fn add(&self, record: &Record) -> RepoResult<RecordId> {
        let id = self.repo.add(record)?;
        self.notify(ChangeEvent::Added(id));
        Ok(id)
    }

    /// Overwrites every field of `id`. Unknown ids are a silent no-op and
    /// notify nobody; the return value tells whether a record changed.
    pub fn update(&self, id: RecordId, record: &Record) -> RepoResult<bool> {
        let changed = self.repo.update(id, record)?;
        if changed {
            self.notify(ChangeEvent::Updated(id));
        }
        Ok(changed)
    }

    pub fn delete(&self, id: RecordId) -> RepoResult<bool> {
        let deleted = self.repo.delete(id)?;
        if deleted {
            self.notify(ChangeEvent::Deleted(id));
        }
        Ok(deleted)
    }

    fn notify(&self, event: ChangeEvent) {
        debug!(
            "event=record_change module=service kind={} change={:?} listeners={}",
            self.repo.kind().name(),
            event,
            self.listeners.len()
        );
        for listener in &self.listeners {
            listener.on_change(&event);
        }
    }
}
