//! Field values passed across the catalog call surface.

use super::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One field value as supplied by callers.
///
/// Serialized untagged: text as a JSON string, references as a number or
/// `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text for `name`/`title` style fields.
    Text(String),
    /// Optional foreign key. `None` clears the reference.
    Ref(Option<RecordId>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn reference(id: RecordId) -> Self {
        Self::Ref(Some(id))
    }

    pub fn null() -> Self {
        Self::Ref(None)
    }

    /// Short kind label used in mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Ref(_) => "reference",
        }
    }
}

/// Field name to value mapping for create requests.
///
/// Iteration order is by field name, so validation errors are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated name replaces the earlier value.
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> + '_ {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Fields {
    fn from_iter<T: IntoIterator<Item = (K, FieldValue)>>(iter: T) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Fields};

    #[test]
    fn repeated_name_keeps_last_value() {
        let fields = Fields::new()
            .with("name", FieldValue::text("first"))
            .with("name", FieldValue::text("second"));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("name"), Some(&FieldValue::text("second")));
    }

    #[test]
    fn iteration_is_sorted_by_name() {
        let fields: Fields = [
            ("title", FieldValue::text("X")),
            ("author_id", FieldValue::reference(1)),
        ]
        .into_iter()
        .collect();
        let names: Vec<&str> = fields.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["author_id", "title"]);
    }
}
