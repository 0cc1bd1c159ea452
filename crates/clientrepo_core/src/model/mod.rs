//! Record-centric domain model shared by every storage backend.
//!
//! # Responsibility
//! - Define the record shape, scalar values and record kinds.
//! - Keep validation next to the field declarations it enforces.
//!
//! # Invariants
//! - Every stored record is identified by an integer `id`.
//! - Display views are projections of one record type, not separate types.

pub mod kind;
pub mod projection;
pub mod record;
pub mod value;
