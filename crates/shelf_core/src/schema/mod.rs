//! Static schema declarations for the catalog.
//!
//! # Responsibility
//! - Declare per-table fields and the foreign-key relationships between tables.
//! - Resolve references and plan delete cascades from that declaration.
//!
//! # Invariants
//! - The registry holds no mutable state after construction.
//! - Every relationship names a declared `ForeignKey` field on its child table.
//! - Delete behavior is driven only by each relationship's `DeletePolicy`.

use crate::model::{
    ConstraintViolation, FieldValue, Fields, RecordId, TableKind, FIELD_AUTHOR_ID, FIELD_GENRE_ID,
    FIELD_NAME, FIELD_TITLE,
};
use std::collections::BTreeSet;

/// Declared kind of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Optional reference to the primary key of `parent`.
    ForeignKey(TableKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// What happens to child rows when their parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Children are deleted together with the parent.
    Cascade,
    /// The parent delete fails while children exist.
    Restrict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub child: TableKind,
    pub parent: TableKind,
    pub fk_field: &'static str,
    pub on_delete: DeletePolicy,
}

/// Read access to table contents needed for reference checks.
pub trait TableLookup {
    fn contains(&self, table: TableKind, id: RecordId) -> bool;
    /// Ids in `table` whose `fk_field` equals `parent_id`, ascending.
    fn referencing(&self, table: TableKind, fk_field: &str, parent_id: RecordId) -> Vec<RecordId>;
}

const AUTHOR_FIELDS: &[FieldDef] = &[FieldDef {
    name: FIELD_NAME,
    kind: FieldKind::Text,
    required: true,
}];

const GENRE_FIELDS: &[FieldDef] = &[FieldDef {
    name: FIELD_NAME,
    kind: FieldKind::Text,
    required: true,
}];

const BOOK_FIELDS: &[FieldDef] = &[
    FieldDef {
        name: FIELD_TITLE,
        kind: FieldKind::Text,
        required: true,
    },
    FieldDef {
        name: FIELD_AUTHOR_ID,
        kind: FieldKind::ForeignKey(TableKind::Author),
        required: false,
    },
    FieldDef {
        name: FIELD_GENRE_ID,
        kind: FieldKind::ForeignKey(TableKind::Genre),
        required: false,
    },
];

/// Table and relationship declarations for one catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    relations: Vec<Relation>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::library()
    }
}

impl SchemaRegistry {
    /// Author/Genre/Book schema; both book relationships cascade on delete.
    pub fn library() -> Self {
        Self {
            relations: vec![
                Relation {
                    child: TableKind::Book,
                    parent: TableKind::Author,
                    fk_field: FIELD_AUTHOR_ID,
                    on_delete: DeletePolicy::Cascade,
                },
                Relation {
                    child: TableKind::Book,
                    parent: TableKind::Genre,
                    fk_field: FIELD_GENRE_ID,
                    on_delete: DeletePolicy::Cascade,
                },
            ],
        }
    }

    /// Returns a copy with the delete policy of one relationship replaced.
    ///
    /// Unknown `(child, fk_field)` pairs leave the schema unchanged.
    pub fn with_delete_policy(
        mut self,
        child: TableKind,
        fk_field: &str,
        policy: DeletePolicy,
    ) -> Self {
        for relation in &mut self.relations {
            if relation.child == child && relation.fk_field == fk_field {
                relation.on_delete = policy;
            }
        }
        self
    }

    pub fn fields(&self, table: TableKind) -> &'static [FieldDef] {
        match table {
            TableKind::Author => AUTHOR_FIELDS,
            TableKind::Genre => GENRE_FIELDS,
            TableKind::Book => BOOK_FIELDS,
        }
    }

    pub fn field(&self, table: TableKind, name: &str) -> Option<&'static FieldDef> {
        self.fields(table).iter().find(|field| field.name == name)
    }

    /// Relationships where `child` holds the foreign key.
    pub fn relations_from(&self, child: TableKind) -> impl Iterator<Item = &Relation> + '_ {
        self.relations
            .iter()
            .filter(move |relation| relation.child == child)
    }

    /// Relationships pointing at `parent`.
    pub fn relations_to(&self, parent: TableKind) -> impl Iterator<Item = &Relation> + '_ {
        self.relations
            .iter()
            .filter(move |relation| relation.parent == parent)
    }

    /// Direct dependents of one parent row across every relationship.
    pub fn dependents_of(
        &self,
        parent: TableKind,
        parent_id: RecordId,
        tables: &impl TableLookup,
    ) -> BTreeSet<(TableKind, RecordId)> {
        self.relations_to(parent)
            .flat_map(|relation| {
                tables
                    .referencing(relation.child, relation.fk_field, parent_id)
                    .into_iter()
                    .map(move |child_id| (relation.child, child_id))
            })
            .collect()
    }

    /// Checks that `table.field = id` names an existing parent row.
    pub fn validate_reference(
        &self,
        table: TableKind,
        field: &str,
        id: RecordId,
        tables: &impl TableLookup,
    ) -> Result<(), ConstraintViolation> {
        let def = self
            .field(table, field)
            .ok_or_else(|| ConstraintViolation::UnknownField {
                table,
                field: field.to_string(),
            })?;

        let FieldKind::ForeignKey(parent) = def.kind else {
            return Err(ConstraintViolation::FieldKindMismatch {
                table,
                field: def.name,
                expected: "text",
                found: "reference",
            });
        };

        if tables.contains(parent, id) {
            Ok(())
        } else {
            Err(ConstraintViolation::UnresolvedReference {
                table,
                field: def.name,
                parent,
                id,
            })
        }
    }

    /// Resolves every set foreign key in a create request.
    ///
    /// Fields that are not foreign keys are left to record validation.
    pub fn check_references(
        &self,
        table: TableKind,
        fields: &Fields,
        tables: &impl TableLookup,
    ) -> Result<(), ConstraintViolation> {
        for relation in self.relations_from(table) {
            if let Some(FieldValue::Ref(Some(id))) = fields.get(relation.fk_field) {
                self.validate_reference(table, relation.fk_field, *id, tables)?;
            }
        }
        Ok(())
    }

    /// Lists every row a delete of `(table, id)` removes, parents first.
    ///
    /// Follows `Cascade` relationships transitively. The first child found
    /// under a `Restrict` relationship aborts the plan.
    pub fn plan_delete(
        &self,
        table: TableKind,
        id: RecordId,
        tables: &impl TableLookup,
    ) -> Result<Vec<(TableKind, RecordId)>, ConstraintViolation> {
        let mut planned = Vec::new();
        let mut seen = BTreeSet::new();
        let mut pending = vec![(table, id)];

        while let Some((current_table, current_id)) = pending.pop() {
            if !seen.insert((current_table, current_id)) {
                continue;
            }
            planned.push((current_table, current_id));

            for relation in self.relations_to(current_table) {
                let children = tables.referencing(relation.child, relation.fk_field, current_id);
                match (relation.on_delete, children.first()) {
                    (DeletePolicy::Restrict, Some(&dependent_id)) => {
                        return Err(ConstraintViolation::RestrictedDelete {
                            table: current_table,
                            id: current_id,
                            dependent: relation.child,
                            dependent_id,
                        });
                    }
                    (DeletePolicy::Restrict, None) => {}
                    (DeletePolicy::Cascade, _) => {
                        // Reverse so the stack pops children in ascending id order.
                        pending.extend(
                            children
                                .into_iter()
                                .rev()
                                .map(|child_id| (relation.child, child_id)),
                        );
                    }
                }
            }
        }

        Ok(planned)
    }

    /// Converts raw console text into a value of the declared field kind.
    ///
    /// For foreign keys, blank input or `none`/`null` clears the reference.
    pub fn parse_input(
        &self,
        table: TableKind,
        field: &str,
        raw: &str,
    ) -> Result<FieldValue, ConstraintViolation> {
        let def = self
            .field(table, field)
            .ok_or_else(|| ConstraintViolation::UnknownField {
                table,
                field: field.to_string(),
            })?;

        match def.kind {
            FieldKind::Text => Ok(FieldValue::text(raw)),
            FieldKind::ForeignKey(_) => {
                let trimmed = raw.trim();
                if trimmed.is_empty()
                    || trimmed.eq_ignore_ascii_case("none")
                    || trimmed.eq_ignore_ascii_case("null")
                {
                    return Ok(FieldValue::null());
                }
                trimmed
                    .parse::<RecordId>()
                    .map(FieldValue::reference)
                    .map_err(|_| ConstraintViolation::InvalidInput {
                        table,
                        field: def.name,
                        input: trimmed.to_string(),
                    })
            }
        }
    }
}
