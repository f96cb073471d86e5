//! Catalog record types.
//!
//! # Responsibility
//! - Define the Author/Genre/Book records and their field-level validation.
//! - Provide the `Entity` contract the generic record store is built on.
//!
//! # Invariants
//! - `name`/`title` are trimmed and never empty after validation.
//! - Records are only built by the store, which assigns `id`.
//! - Foreign-key existence is not checked here; that needs the other tables.

use super::{FieldValue, Fields, RecordId, TableKind};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FIELD_NAME: &str = "name";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_AUTHOR_ID: &str = "author_id";
pub const FIELD_GENRE_ID: &str = "genre_id";

/// Field-level and reference-level constraint failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// Required text field is blank after trim.
    EmptyField {
        table: TableKind,
        field: &'static str,
    },
    /// Required field was not supplied.
    MissingField {
        table: TableKind,
        field: &'static str,
    },
    /// Field name is not declared for the table.
    UnknownField { table: TableKind, field: String },
    /// Value kind does not match the declared field kind.
    FieldKindMismatch {
        table: TableKind,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// Raw console input cannot be converted to the declared field kind.
    InvalidInput {
        table: TableKind,
        field: &'static str,
        input: String,
    },
    /// Foreign key names a parent row that does not exist.
    UnresolvedReference {
        table: TableKind,
        field: &'static str,
        parent: TableKind,
        id: RecordId,
    },
    /// Delete blocked by a `Restrict` relationship.
    RestrictedDelete {
        table: TableKind,
        id: RecordId,
        dependent: TableKind,
        dependent_id: RecordId,
    },
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { table, field } => {
                write!(f, "{table}.{field} must not be empty")
            }
            Self::MissingField { table, field } => write!(f, "{table}.{field} is required"),
            Self::UnknownField { table, field } => {
                write!(f, "{table} has no field `{field}`")
            }
            Self::FieldKindMismatch {
                table,
                field,
                expected,
                found,
            } => write!(f, "{table}.{field} expects {expected}, got {found}"),
            Self::InvalidInput {
                table,
                field,
                input,
            } => write!(f, "{table}.{field} cannot accept input `{input}`"),
            Self::UnresolvedReference {
                table,
                field,
                parent,
                id,
            } => write!(f, "{table}.{field} references missing {parent} row {id}"),
            Self::RestrictedDelete {
                table,
                id,
                dependent,
                dependent_id,
            } => write!(
                f,
                "{table} row {id} is still referenced by {dependent} row {dependent_id}"
            ),
        }
    }
}

impl Error for ConstraintViolation {}

/// Contract between record types and the generic record store.
pub trait Entity: Clone + Serialize {
    const KIND: TableKind;

    fn id(&self) -> RecordId;

    /// Builds a record from caller fields. Rejects unknown and missing fields.
    fn from_fields(id: RecordId, fields: &Fields) -> Result<Self, ConstraintViolation>;

    /// Overwrites one field in place without validating the whole record.
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConstraintViolation>;

    /// Current value of a foreign-key field; `None` when unset or not a key.
    fn reference(&self, field: &str) -> Option<RecordId>;

    fn validate(&self) -> Result<(), ConstraintViolation>;

    fn into_record(self) -> Record;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: RecordId,
    pub title: String,
    pub author_id: Option<RecordId>,
    pub genre_id: Option<RecordId>,
}

impl Entity for Author {
    const KIND: TableKind = TableKind::Author;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_fields(id: RecordId, fields: &Fields) -> Result<Self, ConstraintViolation> {
        reject_unknown(Self::KIND, fields, &[FIELD_NAME])?;
        Ok(Self {
            id,
            name: required_text(Self::KIND, FIELD_NAME, fields)?,
        })
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConstraintViolation> {
        match field {
            FIELD_NAME => self.name = text_value(Self::KIND, FIELD_NAME, value)?,
            other => return Err(unknown_field(Self::KIND, other)),
        }
        Ok(())
    }

    fn reference(&self, _field: &str) -> Option<RecordId> {
        None
    }

    fn validate(&self) -> Result<(), ConstraintViolation> {
        non_empty(Self::KIND, FIELD_NAME, &self.name)
    }

    fn into_record(self) -> Record {
        Record::Author(self)
    }
}

impl Entity for Genre {
    const KIND: TableKind = TableKind::Genre;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_fields(id: RecordId, fields: &Fields) -> Result<Self, ConstraintViolation> {
        reject_unknown(Self::KIND, fields, &[FIELD_NAME])?;
        Ok(Self {
            id,
            name: required_text(Self::KIND, FIELD_NAME, fields)?,
        })
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConstraintViolation> {
        match field {
            FIELD_NAME => self.name = text_value(Self::KIND, FIELD_NAME, value)?,
            other => return Err(unknown_field(Self::KIND, other)),
        }
        Ok(())
    }

    fn reference(&self, _field: &str) -> Option<RecordId> {
        None
    }

    fn validate(&self) -> Result<(), ConstraintViolation> {
        non_empty(Self::KIND, FIELD_NAME, &self.name)
    }

    fn into_record(self) -> Record {
        Record::Genre(self)
    }
}

impl Entity for Book {
    const KIND: TableKind = TableKind::Book;

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_fields(id: RecordId, fields: &Fields) -> Result<Self, ConstraintViolation> {
        reject_unknown(
            Self::KIND,
            fields,
            &[FIELD_TITLE, FIELD_AUTHOR_ID, FIELD_GENRE_ID],
        )?;
        Ok(Self {
            id,
            title: required_text(Self::KIND, FIELD_TITLE, fields)?,
            author_id: optional_ref(Self::KIND, FIELD_AUTHOR_ID, fields)?,
            genre_id: optional_ref(Self::KIND, FIELD_GENRE_ID, fields)?,
        })
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ConstraintViolation> {
        match field {
            FIELD_TITLE => self.title = text_value(Self::KIND, FIELD_TITLE, value)?,
            FIELD_AUTHOR_ID => self.author_id = ref_value(Self::KIND, FIELD_AUTHOR_ID, value)?,
            FIELD_GENRE_ID => self.genre_id = ref_value(Self::KIND, FIELD_GENRE_ID, value)?,
            other => return Err(unknown_field(Self::KIND, other)),
        }
        Ok(())
    }

    fn reference(&self, field: &str) -> Option<RecordId> {
        match field {
            FIELD_AUTHOR_ID => self.author_id,
            FIELD_GENRE_ID => self.genre_id,
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ConstraintViolation> {
        non_empty(Self::KIND, FIELD_TITLE, &self.title)
    }

    fn into_record(self) -> Record {
        Record::Book(self)
    }
}

/// Table-erased record returned by dynamic reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum Record {
    Author(Author),
    Genre(Genre),
    Book(Book),
}

impl Record {
    pub fn kind(&self) -> TableKind {
        match self {
            Self::Author(_) => TableKind::Author,
            Self::Genre(_) => TableKind::Genre,
            Self::Book(_) => TableKind::Book,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            Self::Author(author) => author.id,
            Self::Genre(genre) => genre.id,
            Self::Book(book) => book.id,
        }
    }
}

fn reject_unknown(
    table: TableKind,
    fields: &Fields,
    known: &[&'static str],
) -> Result<(), ConstraintViolation> {
    match fields.iter().find(|(name, _)| !known.contains(name)) {
        Some((name, _)) => Err(unknown_field(table, name)),
        None => Ok(()),
    }
}

fn unknown_field(table: TableKind, field: &str) -> ConstraintViolation {
    ConstraintViolation::UnknownField {
        table,
        field: field.to_string(),
    }
}

fn required_text(
    table: TableKind,
    field: &'static str,
    fields: &Fields,
) -> Result<String, ConstraintViolation> {
    match fields.get(field) {
        Some(value) => text_value(table, field, value.clone()),
        None => Err(ConstraintViolation::MissingField { table, field }),
    }
}

fn optional_ref(
    table: TableKind,
    field: &'static str,
    fields: &Fields,
) -> Result<Option<RecordId>, ConstraintViolation> {
    match fields.get(field) {
        Some(value) => ref_value(table, field, value.clone()),
        None => Ok(None),
    }
}

fn text_value(
    table: TableKind,
    field: &'static str,
    value: FieldValue,
) -> Result<String, ConstraintViolation> {
    match value {
        FieldValue::Text(text) => Ok(text.trim().to_string()),
        other => Err(ConstraintViolation::FieldKindMismatch {
            table,
            field,
            expected: "text",
            found: other.kind_name(),
        }),
    }
}

fn ref_value(
    table: TableKind,
    field: &'static str,
    value: FieldValue,
) -> Result<Option<RecordId>, ConstraintViolation> {
    match value {
        FieldValue::Ref(id) => Ok(id),
        other => Err(ConstraintViolation::FieldKindMismatch {
            table,
            field,
            expected: "reference",
            found: other.kind_name(),
        }),
    }
}

fn non_empty(table: TableKind, field: &'static str, value: &str) -> Result<(), ConstraintViolation> {
    if value.trim().is_empty() {
        return Err(ConstraintViolation::EmptyField { table, field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_from_fields_trims_title_and_defaults_references() {
        let fields = Fields::new().with(FIELD_TITLE, FieldValue::text("  Dune  "));
        let book = Book::from_fields(4, &fields).expect("book should build");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author_id, None);
        assert_eq!(book.genre_id, None);
        assert_eq!(book.id(), 4);
    }

    #[test]
    fn author_rejects_unknown_and_missing_fields() {
        let unknown = Fields::new()
            .with(FIELD_NAME, FieldValue::text("Doe"))
            .with("age", FieldValue::text("40"));
        assert_eq!(
            Author::from_fields(1, &unknown),
            Err(ConstraintViolation::UnknownField {
                table: TableKind::Author,
                field: "age".to_string(),
            })
        );

        assert_eq!(
            Author::from_fields(1, &Fields::new()),
            Err(ConstraintViolation::MissingField {
                table: TableKind::Author,
                field: FIELD_NAME,
            })
        );
    }

    #[test]
    fn blank_name_fails_validation() {
        let fields = Fields::new().with(FIELD_NAME, FieldValue::text("   "));
        let genre = Genre::from_fields(1, &fields).expect("shape is valid");
        assert_eq!(
            genre.validate(),
            Err(ConstraintViolation::EmptyField {
                table: TableKind::Genre,
                field: FIELD_NAME,
            })
        );
    }

    #[test]
    fn set_field_rejects_kind_mismatch() {
        let mut book = Book {
            id: 1,
            title: "X".to_string(),
            author_id: None,
            genre_id: None,
        };
        let err = book
            .set_field(FIELD_AUTHOR_ID, FieldValue::text("1"))
            .expect_err("text is not a reference");
        assert!(matches!(
            err,
            ConstraintViolation::FieldKindMismatch {
                expected: "reference",
                ..
            }
        ));

        book.set_field(FIELD_GENRE_ID, FieldValue::reference(3))
            .expect("reference should apply");
        assert_eq!(book.reference(FIELD_GENRE_ID), Some(3));
    }

    #[test]
    fn record_serializes_with_table_tag() {
        let record = Author {
            id: 2,
            name: "Jane Smith".to_string(),
        }
        .into_record();
        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json["table"], "author");
        assert_eq!(json["name"], "Jane Smith");
        assert_eq!(record.kind(), TableKind::Author);
        assert_eq!(record.id(), 2);
    }
}
