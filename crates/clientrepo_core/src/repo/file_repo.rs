//! File-backed repositories over a JSON or YAML collection.
//!
//! # Responsibility
//! - Read the whole collection, filter/sort/slice in memory.
//! - Rewrite the whole collection on every mutation.
//!
//! # Invariants
//! - A missing or blank file is an empty collection.
//! - New ids are `max(id) + 1`, or `1` for an empty collection.
//! - Every stored record must carry an integer `id`; anything else is corrupt.
//! - Writes land in a sibling temp file that is renamed over the target.
//!
//! There is no cross-process locking: concurrent writers can lose updates.

use crate::db::StorageError;
use crate::model::kind::RecordKind;
use crate::model::record::{Record, RecordId};
use crate::repo::query::{compare_by_field, select_matching};
use crate::repo::record_repo::{ListQuery, PageRequest, PredicateSet, RepoResult, Repository};
use log::{debug, error};
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Text encoding of a whole record collection.
pub trait CollectionCodec {
    /// Format label used in log events.
    const FORMAT: &'static str;

    fn decode(input: &str) -> Result<Vec<Record>, String>;
    fn encode(records: &[Record]) -> Result<String, String>;
}

/// JSON array of flat objects, pretty-printed with four-space indent.
pub struct JsonCodec;

impl CollectionCodec for JsonCodec {
    const FORMAT: &'static str = "json";

    fn decode(input: &str) -> Result<Vec<Record>, String> {
        serde_json::from_str(input).map_err(|err| err.to_string())
    }

    fn encode(records: &[Record]) -> Result<String, String> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        records
            .serialize(&mut serializer)
            .map_err(|err| err.to_string())?;
        String::from_utf8(buffer).map_err(|err| err.to_string())
    }
}

/// YAML sequence of flat mappings.
pub struct YamlCodec;

impl CollectionCodec for YamlCodec {
    const FORMAT: &'static str = "yaml";

    fn decode(input: &str) -> Result<Vec<Record>, String> {
        let records: Option<Vec<Record>> =
            serde_yaml::from_str(input).map_err(|err| err.to_string())?;
        Ok(records.unwrap_or_default())
    }

    fn encode(records: &[Record]) -> Result<String, String> {
        serde_yaml::to_string(records).map_err(|err| err.to_string())
    }
}

/// Repository over one collection file.
pub struct FileRepository<C: CollectionCodec> {
    path: PathBuf,
    kind: RecordKind,
    _codec: PhantomData<C>,
}

pub type JsonFileRepository = FileRepository<JsonCodec>;
pub type YamlFileRepository = FileRepository<YamlCodec>;

impl<C: CollectionCodec> FileRepository<C> {
    /// Does not touch the file; it is created by the first mutation.
    pub fn new(path: impl Into<PathBuf>, kind: RecordKind) -> Self {
        Self {
            path: path.into(),
            kind,
            _codec: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full collection in stored order.
    pub fn read_all(&self) -> RepoResult<Vec<Record>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records = C::decode(&text).map_err(|message| self.corrupt(message))?;
        if let Some(position) = records.iter().position(|record| record.id().is_none()) {
            return Err(self
                .corrupt(format!("record at index {position} has no integer `id`"))
                .into());
        }

        Ok(records)
    }

    /// Replaces the full collection on disk.
    pub fn write_all(&self, records: &[Record]) -> RepoResult<()> {
        let encoded = C::encode(records).map_err(|message| self.corrupt(message))?;
        let temp_path = self.temp_path();

        std::fs::write(&temp_path, encoded).map_err(|source| self.io_error(&temp_path, source))?;
        if let Err(source) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            error!(
                "event=file_write module=repo status=error format={} error={}",
                C::FORMAT,
                source
            );
            return Err(self.io_error(&self.path, source).into());
        }

        debug!(
            "event=file_write module=repo status=ok format={} records={}",
            C::FORMAT,
            records.len()
        );
        Ok(())
    }

    /// Rewrites the stored collection in ascending order of `field`.
    pub fn sort_in_place(&self, field: &str) -> RepoResult<()> {
        self.kind.check_queryable(field)?;
        let mut records = self.read_all()?;
        records.sort_by(|left, right| compare_by_field(left, right, field));
        self.write_all(&records)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn corrupt(&self, message: String) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            message,
        }
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn log_mutation(&self, op: &str, id: RecordId, changed: bool) {
        debug!(
            "event=repo_write module=repo status=ok op={} backend={} kind={} id={} changed={}",
            op,
            C::FORMAT,
            self.kind.name(),
            id,
            changed
        );
    }
}

/// `max(id) + 1`, or `1` for an empty collection.
fn next_id(records: &[Record]) -> Result<RecordId, StorageError> {
    match records.iter().filter_map(Record::id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| StorageError::InvalidData("id space exhausted".to_string())),
    }
}

impl<C: CollectionCodec> Repository for FileRepository<C> {
    fn kind(&self) -> &RecordKind {
        &self.kind
    }

    fn get_by_id(&self, id: RecordId) -> RepoResult<Option<Record>> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|record| record.id() == Some(id)))
    }

    fn get_page(&self, page: PageRequest, query: &ListQuery) -> RepoResult<Vec<Record>> {
        let selected = select_matching(
            &self.kind,
            self.read_all()?,
            &query.predicates,
            query.sort_by.as_deref(),
        )?;

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(selected
            .into_iter()
            .skip(offset)
            .take(page.size() as usize)
            .collect())
    }

    fn count(&self, predicates: &PredicateSet) -> RepoResult<u64> {
        let selected = select_matching(&self.kind, self.read_all()?, predicates, None)?;
        Ok(selected.len() as u64)
    }

    fn add(&self, record: &Record) -> RepoResult<RecordId> {
        self.kind.validate_new(record)?;

        let mut records = self.read_all()?;
        let id = next_id(&records)?;

        let mut stored = self.kind.normalize(record);
        stored.set_id(id);
        records.push(stored);
        self.write_all(&records)?;

        self.log_mutation("add", id, true);
        Ok(id)
    }

    fn update(&self, id: RecordId, record: &Record) -> RepoResult<bool> {
        self.kind.validate_replacement(id, record)?;

        let mut records = self.read_all()?;
        let Some(slot) = records.iter_mut().find(|stored| stored.id() == Some(id)) else {
            self.log_mutation("update", id, false);
            return Ok(false);
        };

        let mut replacement = self.kind.normalize(record);
        replacement.set_id(id);
        *slot = replacement;
        self.write_all(&records)?;

        self.log_mutation("update", id, true);
        Ok(true)
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        let mut records = self.read_all()?;
        let before = records.len();
        records.retain(|record| record.id() != Some(id));

        let changed = records.len() != before;
        if changed {
            self.write_all(&records)?;
        }

        self.log_mutation("delete", id, changed);
        Ok(changed)
    }
}
