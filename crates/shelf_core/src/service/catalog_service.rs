//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide the only entry points for create/read/update/delete, the two
//!   fixed joins, and commit.
//! - Coordinate cross-table work: reference checks before writes, cascade
//!   planning before deletes, snapshot flushes on commit.
//!
//! # Invariants
//! - Every failed operation leaves all tables unchanged.
//! - A delete removes nothing until the full cascade plan has been computed
//!   and no `Restrict` relationship blocks it.
//! - The service never prints; results and errors are returned to callers.

use crate::db::{CatalogSnapshot, DbError, SnapshotStore, TableSnapshot};
use crate::model::{
    Author, Book, ConstraintViolation, Entity, FieldValue, Fields, Genre, Record, RecordId,
    TableKind, UnknownTableKind, FIELD_AUTHOR_ID, FIELD_GENRE_ID, FIELD_NAME,
};
use crate::query::{inner_join, left_outer_join, InnerJoin, LeftOuterJoin};
use crate::schema::{SchemaRegistry, TableLookup};
use crate::store::{RecordStore, StoreError, StoreResult};
use log::{error, info, warn};
use std::collections::btree_map::Values;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors returned across the catalog call surface.
#[derive(Debug)]
pub enum CatalogError {
    /// Target row does not exist.
    NotFound { table: TableKind, id: RecordId },
    /// Field or reference constraint failed; nothing was written.
    ConstraintViolation(ConstraintViolation),
    /// Caller supplied a table selector outside the closed set.
    InvalidTableKind(String),
    /// Snapshot store failure; in-memory state is unchanged.
    Storage(DbError),
}

impl CatalogError {
    /// Stable code used in log events and console output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::InvalidTableKind(_) => "invalid_table_kind",
            Self::Storage(_) => "storage",
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { table, id } => write!(f, "{table} row not found: {id}"),
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::InvalidTableKind(value) => write!(f, "invalid table kind: `{value}`"),
            Self::Storage(err) => write!(f, "snapshot storage error: {err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConstraintViolation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidTableKind(_) => None,
        }
    }
}

impl From<ConstraintViolation> for CatalogError {
    fn from(value: ConstraintViolation) -> Self {
        Self::ConstraintViolation(value)
    }
}

impl From<UnknownTableKind> for CatalogError {
    fn from(value: UnknownTableKind) -> Self {
        Self::InvalidTableKind(value.0)
    }
}

impl From<DbError> for CatalogError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { table, id } => Self::NotFound { table, id },
            StoreError::Constraint(err) => Self::ConstraintViolation(err),
            invalid @ StoreError::InvalidRestore { .. } => {
                Self::Storage(DbError::InvalidData(invalid.to_string()))
            }
        }
    }
}

/// Rows removed by one delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub table: TableKind,
    pub id: RecordId,
    /// Dependents removed by cascade, in plan order.
    pub cascaded: Vec<(TableKind, RecordId)>,
}

impl DeleteReport {
    /// Primary row first, then every cascaded row.
    pub fn deleted(&self) -> impl Iterator<Item = (TableKind, RecordId)> + '_ {
        std::iter::once((self.table, self.id)).chain(self.cascaded.iter().copied())
    }

    pub fn total(&self) -> usize {
        1 + self.cascaded.len()
    }
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub authors: usize,
    pub genres: usize,
    pub books: usize,
}

impl CatalogStats {
    pub fn total(&self) -> usize {
        self.authors + self.genres + self.books
    }
}

/// Lazy, table-erased row sequence returned by `read`.
pub enum Rows<'a> {
    Authors(Values<'a, RecordId, Author>),
    Genres(Values<'a, RecordId, Genre>),
    Books(Values<'a, RecordId, Book>),
}

impl Iterator for Rows<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Authors(rows) => rows.next().cloned().map(Entity::into_record),
            Self::Genres(rows) => rows.next().cloned().map(Entity::into_record),
            Self::Books(rows) => rows.next().cloned().map(Entity::into_record),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Authors(rows) => rows.size_hint(),
            Self::Genres(rows) => rows.size_hint(),
            Self::Books(rows) => rows.size_hint(),
        }
    }
}

/// The three catalog tables, owned together.
#[derive(Debug, Clone, Default)]
struct Tables {
    authors: RecordStore<Author>,
    genres: RecordStore<Genre>,
    books: RecordStore<Book>,
}

impl Tables {
    fn restore(snapshot: CatalogSnapshot) -> StoreResult<Self> {
        Ok(Self {
            authors: RecordStore::restore(snapshot.authors.rows, snapshot.authors.next_id)?,
            genres: RecordStore::restore(snapshot.genres.rows, snapshot.genres.next_id)?,
            books: RecordStore::restore(snapshot.books.rows, snapshot.books.next_id)?,
        })
    }

    fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            authors: table_snapshot(&self.authors),
            genres: table_snapshot(&self.genres),
            books: table_snapshot(&self.books),
        }
    }

    fn insert(&mut self, table: TableKind, fields: &Fields) -> StoreResult<RecordId> {
        match table {
            TableKind::Author => self.authors.insert(fields),
            TableKind::Genre => self.genres.insert(fields),
            TableKind::Book => self.books.insert(fields),
        }
    }

    fn update(
        &mut self,
        table: TableKind,
        id: RecordId,
        field: &str,
        value: FieldValue,
    ) -> StoreResult<()> {
        match table {
            TableKind::Author => self.authors.update(id, field, value),
            TableKind::Genre => self.genres.update(id, field, value),
            TableKind::Book => self.books.update(id, field, value),
        }
    }

    fn remove(&mut self, table: TableKind, id: RecordId) -> StoreResult<()> {
        match table {
            TableKind::Author => self.authors.delete(id).map(drop),
            TableKind::Genre => self.genres.delete(id).map(drop),
            TableKind::Book => self.books.delete(id).map(drop),
        }
    }

    fn get(&self, table: TableKind, id: RecordId) -> StoreResult<Record> {
        match table {
            TableKind::Author => self.authors.get(id).cloned().map(Entity::into_record),
            TableKind::Genre => self.genres.get(id).cloned().map(Entity::into_record),
            TableKind::Book => self.books.get(id).cloned().map(Entity::into_record),
        }
    }

    fn rows(&self, table: TableKind) -> Rows<'_> {
        match table {
            TableKind::Author => Rows::Authors(self.authors.all()),
            TableKind::Genre => Rows::Genres(self.genres.all()),
            TableKind::Book => Rows::Books(self.books.all()),
        }
    }

    /// Fails on the first stored foreign key that no longer resolves.
    fn check_integrity(&self, schema: &SchemaRegistry) -> Result<(), ConstraintViolation> {
        check_store_references(&self.authors, schema, self)?;
        check_store_references(&self.genres, schema, self)?;
        check_store_references(&self.books, schema, self)
    }
}

impl TableLookup for Tables {
    fn contains(&self, table: TableKind, id: RecordId) -> bool {
        match table {
            TableKind::Author => self.authors.contains(id),
            TableKind::Genre => self.genres.contains(id),
            TableKind::Book => self.books.contains(id),
        }
    }

    fn referencing(&self, table: TableKind, fk_field: &str, parent_id: RecordId) -> Vec<RecordId> {
        match table {
            TableKind::Author => self.authors.ids_referencing(fk_field, parent_id),
            TableKind::Genre => self.genres.ids_referencing(fk_field, parent_id),
            TableKind::Book => self.books.ids_referencing(fk_field, parent_id),
        }
    }
}

/// Single owner of all catalog tables for the process lifetime.
pub struct CatalogService {
    tables: Tables,
    schema: SchemaRegistry,
    store: Option<Box<dyn SnapshotStore>>,
    dirty: bool,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("tables", &self.tables)
            .field("schema", &self.schema)
            .field("store", &self.store.as_ref().map(|_| "<SnapshotStore>"))
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Default for CatalogService {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogService {
    /// Empty in-memory catalog with the library schema and no snapshot store.
    pub fn new() -> Self {
        Self::with_schema(SchemaRegistry::library())
    }

    pub fn with_schema(schema: SchemaRegistry) -> Self {
        Self {
            tables: Tables::default(),
            schema,
            store: None,
            dirty: false,
        }
    }

    /// Restores the catalog from `store` and flushes to it on every commit.
    ///
    /// # Errors
    /// - `Storage` when the snapshot cannot be read, or holds rows that break
    ///   field or reference constraints.
    pub fn open(store: impl SnapshotStore + 'static) -> CatalogResult<Self> {
        Self::open_with_schema(SchemaRegistry::library(), store)
    }

    pub fn open_with_schema(
        schema: SchemaRegistry,
        store: impl SnapshotStore + 'static,
    ) -> CatalogResult<Self> {
        let snapshot = store.load()?;
        let tables = Tables::restore(snapshot)?;
        tables
            .check_integrity(&schema)
            .map_err(|err| CatalogError::Storage(DbError::InvalidData(err.to_string())))?;

        let service = Self {
            tables,
            schema,
            store: Some(Box::new(store)),
            dirty: false,
        };
        let stats = service.stats();
        info!(
            "event=catalog_open module=catalog status=ok authors={} genres={} books={}",
            stats.authors, stats.genres, stats.books
        );
        Ok(service)
    }

    /// Binds `store` to this catalog, replacing any store already attached.
    ///
    /// The catalog is marked dirty, so the next `commit` overwrites whatever
    /// the store held with the current rows.
    pub fn attach_store(&mut self, store: impl SnapshotStore + 'static) {
        let replaced = self.store.replace(Box::new(store)).is_some();
        self.dirty = true;
        info!(
            "event=store_attach module=catalog status=ok replaced={} rows={}",
            replaced,
            self.stats().total()
        );
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Inserts one row after resolving its foreign keys.
    pub fn create(&mut self, table: TableKind, fields: &Fields) -> CatalogResult<RecordId> {
        let result = self.try_create(table, fields);
        match &result {
            Ok(id) => {
                self.dirty = true;
                info!(
                    "event=record_create module=catalog status=ok table={} id={}",
                    table, id
                );
            }
            Err(err) => log_failure("record_create", table, err),
        }
        result
    }

    fn try_create(&mut self, table: TableKind, fields: &Fields) -> CatalogResult<RecordId> {
        self.schema
            .check_references(table, fields, &self.tables)?;
        Ok(self.tables.insert(table, fields)?)
    }

    /// Lazy sequence of every row in `table`, in id order.
    pub fn read(&self, table: TableKind) -> Rows<'_> {
        self.tables.rows(table)
    }

    pub fn get(&self, table: TableKind, id: RecordId) -> CatalogResult<Record> {
        Ok(self.tables.get(table, id)?)
    }

    pub fn authors(&self) -> Values<'_, RecordId, Author> {
        self.tables.authors.all()
    }

    pub fn genres(&self) -> Values<'_, RecordId, Genre> {
        self.tables.genres.all()
    }

    pub fn books(&self) -> Values<'_, RecordId, Book> {
        self.tables.books.all()
    }

    /// Sets one field of one row.
    ///
    /// # Errors
    /// - `NotFound` when the row does not exist (checked first).
    /// - `ConstraintViolation` for unknown fields, kind mismatches, blank
    ///   text, or a foreign key that does not resolve.
    pub fn update_field(
        &mut self,
        table: TableKind,
        id: RecordId,
        field: &str,
        value: FieldValue,
    ) -> CatalogResult<()> {
        let result = self.try_update(table, id, field, value);
        match &result {
            Ok(()) => {
                self.dirty = true;
                info!(
                    "event=record_update module=catalog status=ok table={} id={} field={}",
                    table, id, field
                );
            }
            Err(err) => log_failure("record_update", table, err),
        }
        result
    }

    fn try_update(
        &mut self,
        table: TableKind,
        id: RecordId,
        field: &str,
        value: FieldValue,
    ) -> CatalogResult<()> {
        if !self.tables.contains(table, id) {
            return Err(CatalogError::NotFound { table, id });
        }
        if let FieldValue::Ref(Some(parent_id)) = value {
            self.schema
                .validate_reference(table, field, parent_id, &self.tables)?;
        }
        Ok(self.tables.update(table, id, field, value)?)
    }

    /// Renames one author.
    pub fn update_author_name(&mut self, id: RecordId, new_name: &str) -> CatalogResult<()> {
        self.update_field(TableKind::Author, id, FIELD_NAME, FieldValue::text(new_name))
    }

    /// Deletes one row and every row its cascade policy reaches.
    ///
    /// Either the whole plan is applied or nothing is.
    pub fn delete(&mut self, table: TableKind, id: RecordId) -> CatalogResult<DeleteReport> {
        let result = self.try_delete(table, id);
        match &result {
            Ok(report) => {
                self.dirty = true;
                info!(
                    "event=record_delete module=catalog status=ok table={} id={} cascaded={}",
                    table,
                    id,
                    report.cascaded.len()
                );
            }
            Err(err) => log_failure("record_delete", table, err),
        }
        result
    }

    fn try_delete(&mut self, table: TableKind, id: RecordId) -> CatalogResult<DeleteReport> {
        if !self.tables.contains(table, id) {
            return Err(CatalogError::NotFound { table, id });
        }

        let plan = self.schema.plan_delete(table, id, &self.tables)?;
        // Children go before parents; every planned row is known to exist.
        for &(planned_table, planned_id) in plan.iter().rev() {
            self.tables.remove(planned_table, planned_id)?;
        }

        Ok(DeleteReport {
            table,
            id,
            cascaded: plan.into_iter().skip(1).collect(),
        })
    }

    /// Books paired with their author; books without a resolvable author are skipped.
    pub fn inner_join_books_authors(&self) -> InnerJoin<'_, Book, Author> {
        inner_join(&self.tables.books, &self.tables.authors, FIELD_AUTHOR_ID)
    }

    /// Every book paired with its genre, or `None` when it has none.
    pub fn left_join_books_genres(&self) -> LeftOuterJoin<'_, Book, Genre> {
        left_outer_join(&self.tables.books, &self.tables.genres, FIELD_GENRE_ID)
    }

    /// Finalizes pending changes.
    ///
    /// Without a snapshot store this only clears the dirty flag. With one, the
    /// whole catalog is written in a single transaction; on failure the
    /// catalog stays dirty so the commit can be retried.
    pub fn commit(&mut self) -> CatalogResult<()> {
        let Some(store) = self.store.as_mut() else {
            self.dirty = false;
            info!("event=catalog_commit module=catalog status=ok mode=memory");
            return Ok(());
        };

        if !self.dirty {
            info!("event=catalog_commit module=catalog status=skipped reason=clean");
            return Ok(());
        }

        let snapshot = self.tables.snapshot();
        match store.save(&snapshot) {
            Ok(()) => {
                self.dirty = false;
                info!(
                    "event=catalog_commit module=catalog status=ok mode=snapshot rows={}",
                    snapshot.row_count()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=catalog_commit module=catalog status=error error_code=storage db_code={} error={}",
                    err.code(),
                    err
                );
                Err(CatalogError::Storage(err))
            }
        }
    }

    /// Whether changes were made since the last successful commit.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_snapshot_store(&self) -> bool {
        self.store.is_some()
    }

    /// Copy of the current state in snapshot form.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.tables.snapshot()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            authors: self.tables.authors.len(),
            genres: self.tables.genres.len(),
            books: self.tables.books.len(),
        }
    }
}

fn log_failure(event: &str, table: TableKind, err: &CatalogError) {
    match err {
        CatalogError::Storage(_) => error!(
            "event={} module=catalog status=error table={} error_code={} error={}",
            event,
            table,
            err.code(),
            err
        ),
        // Constraint messages may echo caller input; keep only the code.
        _ => warn!(
            "event={} module=catalog status=error table={} error_code={}",
            event,
            table,
            err.code()
        ),
    }
}

fn table_snapshot<E: Entity>(store: &RecordStore<E>) -> TableSnapshot<E> {
    TableSnapshot {
        rows: store.all().cloned().collect(),
        next_id: store.next_id(),
    }
}

fn check_store_references<E: Entity>(
    store: &RecordStore<E>,
    schema: &SchemaRegistry,
    tables: &Tables,
) -> Result<(), ConstraintViolation> {
    for relation in schema.relations_from(E::KIND) {
        for row in store.all() {
            if let Some(parent_id) = row.reference(relation.fk_field) {
                schema.validate_reference(E::KIND, relation.fk_field, parent_id, tables)?;
            }
        }
    }
    Ok(())
}
