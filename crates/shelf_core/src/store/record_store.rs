//! Generic in-memory table.
//!
//! # Responsibility
//! - Own the rows of exactly one entity type, keyed by `RecordId`.
//! - Assign ids from a per-table monotonic counter.
//!
//! # Invariants
//! - `next_id` is strictly greater than every id ever handed out, so ids are
//!   never reused after delete.
//! - A failed insert or update leaves the table unchanged.
//! - Iteration order is ascending id, which equals insertion order.
//! - The store never reads or writes other tables; cross-table checks belong
//!   to the catalog service.

use crate::model::{ConstraintViolation, Entity, FieldValue, Fields, RecordId, TableKind};
use std::collections::btree_map::{BTreeMap, Values};
use std::error::Error;
use std::fmt::{Display, Formatter};

const FIRST_RECORD_ID: RecordId = 1;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from single-table operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound { table: TableKind, id: RecordId },
    Constraint(ConstraintViolation),
    /// Restored rows are inconsistent with the restored id counter.
    InvalidRestore { table: TableKind, message: String },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { table, id } => write!(f, "{table} row not found: {id}"),
            Self::Constraint(err) => write!(f, "{err}"),
            Self::InvalidRestore { table, message } => {
                write!(f, "invalid {table} snapshot: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Constraint(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidRestore { .. } => None,
        }
    }
}

impl From<ConstraintViolation> for StoreError {
    fn from(value: ConstraintViolation) -> Self {
        Self::Constraint(value)
    }
}

/// Keyed storage for one entity type.
///
/// Read-only outside this crate. Writes go through `CatalogService`, which
/// resolves foreign keys against the other tables before touching a store:
///
/// ```compile_fail
/// use shelf_core::{Book, Fields, RecordStore};
///
/// let mut books = RecordStore::<Book>::new();
/// books.insert(&Fields::new()).ok();
/// ```
#[derive(Debug, Clone)]
pub struct RecordStore<E: Entity> {
    rows: BTreeMap<RecordId, E>,
    next_id: RecordId,
}

impl<E: Entity> Default for RecordStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> RecordStore<E> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: FIRST_RECORD_ID,
        }
    }

    /// Rebuilds a table from persisted rows and its id counter.
    ///
    /// # Errors
    /// - `InvalidRestore` when ids repeat, are zero, or reach `next_id`.
    /// - `Constraint` when a row fails field validation.
    pub(crate) fn restore(records: Vec<E>, next_id: RecordId) -> StoreResult<Self> {
        let mut rows = BTreeMap::new();
        for record in records {
            let id = record.id();
            if id < FIRST_RECORD_ID || id >= next_id {
                return Err(StoreError::InvalidRestore {
                    table: E::KIND,
                    message: format!("id {id} outside 1..{next_id}"),
                });
            }
            record.validate()?;
            if rows.insert(id, record).is_some() {
                return Err(StoreError::InvalidRestore {
                    table: E::KIND,
                    message: format!("duplicate id {id}"),
                });
            }
        }

        Ok(Self {
            rows,
            next_id: next_id.max(FIRST_RECORD_ID),
        })
    }

    /// Builds a record from `fields` under the next id and stores it.
    ///
    /// The id is consumed only when the insert succeeds.
    pub(crate) fn insert(&mut self, fields: &Fields) -> StoreResult<RecordId> {
        let id = self.next_id;
        let record = E::from_fields(id, fields)?;
        record.validate()?;

        self.rows.insert(id, record);
        self.next_id += 1;
        Ok(id)
    }

    pub fn get(&self, id: RecordId) -> StoreResult<&E> {
        self.rows.get(&id).ok_or(StoreError::NotFound {
            table: E::KIND,
            id,
        })
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.rows.contains_key(&id)
    }

    /// Sets one field. The change is applied to a copy and swapped in only
    /// after the whole record validates.
    pub(crate) fn update(
        &mut self,
        id: RecordId,
        field: &str,
        value: FieldValue,
    ) -> StoreResult<()> {
        let current = self.rows.get_mut(&id).ok_or(StoreError::NotFound {
            table: E::KIND,
            id,
        })?;

        let mut candidate = current.clone();
        candidate.set_field(field, value)?;
        candidate.validate()?;
        *current = candidate;
        Ok(())
    }

    /// Removes one row and hands it back.
    pub(crate) fn delete(&mut self, id: RecordId) -> StoreResult<E> {
        self.rows.remove(&id).ok_or(StoreError::NotFound {
            table: E::KIND,
            id,
        })
    }

    /// Rows in id order. Each call starts a new pass.
    pub fn all(&self) -> Values<'_, RecordId, E> {
        self.rows.values()
    }

    /// Ids of rows whose foreign key `field` equals `parent_id`.
    pub fn ids_referencing(&self, field: &str, parent_id: RecordId) -> Vec<RecordId> {
        self.rows
            .values()
            .filter(|record| record.reference(field) == Some(parent_id))
            .map(Entity::id)
            .collect()
    }

    /// Id the next successful insert will receive.
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
