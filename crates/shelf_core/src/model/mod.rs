//! Catalog domain model.
//!
//! # Responsibility
//! - Define the Author/Genre/Book records and the table selector.
//! - Define field values exchanged with callers.
//!
//! # Invariants
//! - Every record is identified by a per-table `RecordId`, assigned
//!   monotonically by its store and never reused.

pub mod field;
pub mod record;
pub mod table;

pub use field::{FieldValue, Fields};
pub use record::{
    Author, Book, ConstraintViolation, Entity, Genre, Record, FIELD_AUTHOR_ID, FIELD_GENRE_ID,
    FIELD_NAME, FIELD_TITLE,
};
pub use table::{TableKind, UnknownTableKind};

/// Per-table primary key. Positive, starts at 1.
pub type RecordId = u64;
