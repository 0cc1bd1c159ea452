//! Record domain model.
//!
//! # Responsibility
//! - Hold one entity instance as a field-name to scalar mapping.
//! - Expose the storage-assigned identity field.
//!
//! # Invariants
//! - `id` is assigned by storage and never rewritten by repositories.
//! - Field iteration order is sorted by name, so SQL binds are deterministic.

use crate::model::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage-assigned record identifier.
pub type RecordId = i64;

/// Name of the identity field present on every stored record.
pub const ID_FIELD: &str = "id";

/// One entity instance.
///
/// Serialized as a flat object, which is the on-disk shape of file backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns the field value, treating an absent field as `Null`.
    pub fn value_or_null(&self, field: &str) -> FieldValue {
        self.fields.get(field).cloned().unwrap_or(FieldValue::Null)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns the identity when it is present and integral.
    pub fn id(&self) -> Option<RecordId> {
        self.fields.get(ID_FIELD).and_then(FieldValue::as_integer)
    }

    pub fn set_id(&mut self, id: RecordId) {
        self.fields
            .insert(ID_FIELD.to_string(), FieldValue::Integer(id));
    }

    /// Copy of this record without the identity field.
    pub fn without_id(&self) -> Self {
        let mut copy = self.clone();
        copy.fields.remove(ID_FIELD);
        copy
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
