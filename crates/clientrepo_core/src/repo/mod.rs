//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the generic record repository contract.
//! - Provide relational (SQLite) and file (JSON/YAML) implementations.
//!
//! # Invariants
//! - Every backend validates writes against the record kind first.
//! - Filtering and sorting go through `query`, never ad-hoc per operation.

pub mod file_repo;
mod query;
pub mod record_repo;
pub mod sqlite_repo;
