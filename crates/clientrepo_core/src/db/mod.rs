//! SQLite connection management and storage error taxonomy.
//!
//! # Responsibility
//! - Own the single live SQLite connection behind `ConnectionManager`.
//! - Run additive schema checks for record kinds.
//! - Define `StorageError`, shared by relational and file backends.
//!
//! # Invariants
//! - One `ConnectionManager` owns exactly one connection and releases it once.
//! - Every write statement commits immediately (auto-commit).

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod manager;
mod open;
pub mod schema;

pub use manager::{ConnectionManager, WriteOutcome};

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-level failure: engine unreachable, statement rejected, or a
/// collection file that cannot be read, written or parsed.
#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Corrupt {
        path: PathBuf,
        message: String,
    },
    /// The connection was already released.
    Closed,
    InvalidData(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Corrupt { path, message } => {
                write!(f, "corrupt collection file `{}`: {message}", path.display())
            }
            Self::Closed => write!(f, "storage connection is closed"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { .. } | Self::Closed | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
