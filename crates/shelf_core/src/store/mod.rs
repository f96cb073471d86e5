//! In-memory table storage.
//!
//! # Responsibility
//! - Hold catalog rows in per-entity tables with monotonic ids.
//! - Report semantic errors (`NotFound`, constraint failures) per table.

pub mod record_store;

pub use record_store::{RecordStore, StoreError, StoreResult};
