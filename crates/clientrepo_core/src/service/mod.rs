//! Use-case service layer.
//!
//! # Responsibility
//! - Expose callable use-cases for UI/HTTP layers without leaking storage.
//! - Orchestrate repository calls and change notification.

pub mod record_service;
