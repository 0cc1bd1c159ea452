//! Storage backend configuration.
//!
//! # Responsibility
//! - Describe which backend to open and where its data lives.
//! - Resolve that description from environment variables for binaries.
//!
//! # Invariants
//! - Blank environment values fall back to the per-backend default path.
//! - Unknown backend names are rejected, not mapped to a default.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Environment variable selecting the backend: `sqlite|memory|json|yaml`.
pub const BACKEND_ENV: &str = "CLIENTREPO_BACKEND";
/// Environment variable holding the database or collection file path.
pub const PATH_ENV: &str = "CLIENTREPO_PATH";

const DEFAULT_SQLITE_PATH: &str = "clientrepo.sqlite3";
const DEFAULT_JSON_PATH: &str = "clients.json";
const DEFAULT_YAML_PATH: &str = "clients.yaml";

/// Backend selection handed to [`crate::Storage::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    Sqlite { path: PathBuf },
    SqliteInMemory,
    JsonFile { path: PathBuf },
    YamlFile { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedBackend(name) => write!(
                f,
                "unsupported storage backend `{name}`; expected sqlite|memory|json|yaml"
            ),
        }
    }
}

impl Error for ConfigError {}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from(DEFAULT_SQLITE_PATH),
        }
    }
}

impl StorageConfig {
    /// Reads `CLIENTREPO_BACKEND` and `CLIENTREPO_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = non_blank(lookup(BACKEND_ENV))
            .map(|value| value.to_ascii_lowercase())
            .unwrap_or_else(|| "sqlite".to_string());
        let path = non_blank(lookup(PATH_ENV)).map(PathBuf::from);

        match backend.as_str() {
            "sqlite" => Ok(Self::Sqlite {
                path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
            }),
            "memory" => Ok(Self::SqliteInMemory),
            "json" => Ok(Self::JsonFile {
                path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_JSON_PATH)),
            }),
            "yaml" | "yml" => Ok(Self::YamlFile {
                path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_YAML_PATH)),
            }),
            _ => Err(ConfigError::UnsupportedBackend(backend)),
        }
    }

    /// Short backend label for logs and CLI output.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::SqliteInMemory => "memory",
            Self::JsonFile { .. } => "json",
            Self::YamlFile { .. } => "yaml",
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
