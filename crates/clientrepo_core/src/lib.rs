//! Generic record repository core.
//! One CRUD + pagination + filter/sort contract over SQLite, JSON and YAML.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, StorageConfig};
pub use db::{ConnectionManager, StorageError, StorageResult, WriteOutcome};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::kind::{FieldFormat, FieldSpec, FieldType, RecordKind, ValidationError};
pub use model::projection::Projection;
pub use model::record::{Record, RecordId, ID_FIELD};
pub use model::value::FieldValue;
pub use repo::file_repo::{
    CollectionCodec, FileRepository, JsonCodec, JsonFileRepository, YamlCodec, YamlFileRepository,
};
pub use repo::record_repo::{
    ListQuery, PageRequest, PredicateSet, RepoError, RepoResult, Repository,
};
pub use repo::sqlite_repo::SqliteRepository;
pub use service::record_service::{ChangeEvent, ChangeListener, RecordService};
pub use storage::Storage;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
