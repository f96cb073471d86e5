//! Embedded relational engine for a small library catalog.
//! This crate is the single source of truth for catalog invariants:
//! unique ids, referential integrity, cascading deletes and join semantics.

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod schema;
pub mod seed;
pub mod service;
pub mod store;

pub use db::{CatalogSnapshot, DbError, SnapshotStore, SqliteSnapshotStore, TableSnapshot};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    Author, Book, ConstraintViolation, Entity, FieldValue, Fields, Genre, Record, RecordId,
    TableKind, UnknownTableKind, FIELD_AUTHOR_ID, FIELD_GENRE_ID, FIELD_NAME, FIELD_TITLE,
};
pub use query::{inner_join, left_outer_join, InnerJoin, LeftOuterJoin};
pub use schema::{DeletePolicy, FieldDef, FieldKind, Relation, SchemaRegistry, TableLookup};
pub use seed::{load_demo_data, SeedSummary};
pub use service::catalog_service::{
    CatalogError, CatalogResult, CatalogService, CatalogStats, DeleteReport, Rows,
};
pub use store::{RecordStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
