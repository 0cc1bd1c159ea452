//! Display projections over records.
//!
//! A projection keeps `id` plus a named subset of fields. It replaces
//! parallel "brief"/"short" record types with one record shape.

use crate::model::record::{Record, ID_FIELD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    name: String,
    fields: Vec<String>,
}

impl Projection {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// `id` and `name`.
    pub fn brief() -> Self {
        Self::new("brief", ["name"])
    }

    /// `id`, `name` and `phone`.
    pub fn short() -> Self {
        Self::new("short", ["name", "phone"])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Copies `id` and the projected fields that exist on `record`.
    pub fn apply(&self, record: &Record) -> Record {
        std::iter::once(ID_FIELD)
            .chain(self.fields.iter().map(String::as_str))
            .filter_map(|field| record.get(field).map(|value| (field, value.clone())))
            .collect()
    }
}
