//! Configured storage handle.
//!
//! # Responsibility
//! - Open the configured backend once (connection or collection location).
//! - Hand out repositories per record kind behind the `Repository` trait.
//!
//! # Invariants
//! - All relational repositories from one `Storage` share one connection.
//! - Callers never see backend-specific types through `repository()`.

use crate::config::StorageConfig;
use crate::db::{ConnectionManager, StorageResult};
use crate::model::kind::RecordKind;
use crate::repo::file_repo::{JsonFileRepository, YamlFileRepository};
use crate::repo::record_repo::{RepoResult, Repository};
use crate::repo::sqlite_repo::SqliteRepository;
use log::info;
use std::path::PathBuf;

pub enum Storage {
    Sqlite(ConnectionManager),
    JsonFile(PathBuf),
    YamlFile(PathBuf),
}

impl Storage {
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let storage = match config {
            StorageConfig::Sqlite { path } => Self::Sqlite(ConnectionManager::open(path)?),
            StorageConfig::SqliteInMemory => Self::Sqlite(ConnectionManager::open_in_memory()?),
            StorageConfig::JsonFile { path } => Self::JsonFile(path.clone()),
            StorageConfig::YamlFile { path } => Self::YamlFile(path.clone()),
        };
        info!(
            "event=storage_open module=core status=ok backend={}",
            config.backend_name()
        );
        Ok(storage)
    }

    /// Repository for `kind` on this storage.
    ///
    /// For file backends every kind maps to the one configured file.
    pub fn repository(&self, kind: RecordKind) -> RepoResult<Box<dyn Repository + '_>> {
        let repo: Box<dyn Repository + '_> = match self {
            Self::Sqlite(db) => Box::new(SqliteRepository::try_new(db, kind)?),
            Self::JsonFile(path) => Box::new(JsonFileRepository::new(path.clone(), kind)),
            Self::YamlFile(path) => Box::new(YamlFileRepository::new(path.clone(), kind)),
        };
        Ok(repo)
    }

    /// Releases the SQLite connection; file backends hold nothing open.
    pub fn close(&self) -> StorageResult<()> {
        match self {
            Self::Sqlite(db) => db.close(),
            Self::JsonFile(_) | Self::YamlFile(_) => Ok(()),
        }
    }
}
