//! Core use-case services.
//!
//! # Responsibility
//! - Combine record stores, schema and joins into caller-facing operations.
//! - Keep console and storage layers decoupled from table internals.

pub mod catalog_service;
