//! Record kinds: the fixed field list of an entity type.
//!
//! # Responsibility
//! - Declare the fields, scalar types and constraints of a record type.
//! - Validate caller-supplied records and query fields before any write.
//! - Normalize records to the full declared field set (overwrite semantics).
//!
//! # Invariants
//! - `id` is never a declared field; storage owns it.
//! - Validation never touches storage, so failures cannot leave partial writes.

use crate::model::record::{Record, RecordId, ID_FIELD};
use crate::model::value::FieldValue;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Scalar storage type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Real,
}

impl FieldType {
    /// Column type used by the SQLite schema check.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
        }
    }

    fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (_, FieldValue::Null)
                | (Self::Text, FieldValue::Text(_))
                | (Self::Integer, FieldValue::Integer(_))
                | (Self::Real, FieldValue::Integer(_) | FieldValue::Real(_))
        )
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
        }
    }
}

/// Extra format rule applied to text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldFormat {
    #[default]
    Plain,
    /// Must contain both `@` and `.`.
    Email,
}

/// Validation failures for caller-supplied records and queries.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    UnknownField { kind: String, field: String },
    MissingField(String),
    WrongType {
        field: String,
        expected: FieldType,
        found: &'static str,
    },
    TooLong {
        field: String,
        max_len: usize,
        actual: usize,
    },
    InvalidEmail(String),
    /// `NaN` or an infinity; no backend can store these.
    NonFiniteReal(String),
    IdNotAllowed,
    IdMismatch { expected: RecordId, found: FieldValue },
    InvalidPage { page: u32, size: u32 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { kind, field } => {
                write!(f, "unknown field `{field}` for record kind `{kind}`")
            }
            Self::MissingField(field) => write!(f, "field `{field}` is required"),
            Self::WrongType {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` expects {expected}, got {found}"),
            Self::TooLong {
                field,
                max_len,
                actual,
            } => write!(
                f,
                "field `{field}` must be at most {max_len} characters, got {actual}"
            ),
            Self::InvalidEmail(field) => write!(f, "field `{field}` is not a valid email address"),
            Self::NonFiniteReal(field) => write!(f, "field `{field}` must be a finite number"),
            Self::IdNotAllowed => write!(f, "`id` is assigned by storage and cannot be supplied"),
            Self::IdMismatch { expected, found } => {
                write!(f, "record `id` {found} does not match target id {expected}")
            }
            Self::InvalidPage { page, size } => write!(
                f,
                "page request ({page}, {size}) is invalid; page and size must both be >= 1"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Declaration of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub max_len: Option<usize>,
    pub format: FieldFormat,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            max_len: None,
            format: FieldFormat::Plain,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Real)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn email(mut self) -> Self {
        self.format = FieldFormat::Email;
        self
    }

    /// Checks one value against this declaration.
    pub fn check(&self, value: &FieldValue) -> Result<(), ValidationError> {
        if !self.field_type.accepts(value) {
            return Err(self.wrong_type(value));
        }

        let text = match value {
            FieldValue::Real(number) if !number.is_finite() => {
                return Err(ValidationError::NonFiniteReal(self.name.clone()));
            }
            FieldValue::Null => {
                return if self.required {
                    Err(ValidationError::MissingField(self.name.clone()))
                } else {
                    Ok(())
                };
            }
            FieldValue::Text(text) => text,
            _ => return Ok(()),
        };

        if self.required && text.trim().is_empty() {
            return Err(ValidationError::MissingField(self.name.clone()));
        }

        if let Some(max_len) = self.max_len {
            let actual = text.chars().count();
            if actual > max_len {
                return Err(ValidationError::TooLong {
                    field: self.name.clone(),
                    max_len,
                    actual,
                });
            }
        }

        if self.format == FieldFormat::Email && !(text.contains('@') && text.contains('.')) {
            return Err(ValidationError::InvalidEmail(self.name.clone()));
        }

        Ok(())
    }

    fn wrong_type(&self, value: &FieldValue) -> ValidationError {
        ValidationError::WrongType {
            field: self.name.clone(),
            expected: self.field_type,
            found: value.type_name(),
        }
    }

    fn coerce(&self, value: FieldValue) -> FieldValue {
        match (self.field_type, value) {
            (FieldType::Real, FieldValue::Integer(number)) => FieldValue::Real(number as f64),
            (_, other) => other,
        }
    }
}

/// Fixed field list of one record type, plus its table/collection name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKind {
    name: String,
    fields: Vec<FieldSpec>,
}

impl RecordKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field declaration. A field named `id` is ignored.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        if spec.name != ID_FIELD && self.spec(&spec.name).is_none() {
            self.fields.push(spec);
        }
        self
    }

    /// Client contact record: name, email and phone.
    pub fn client() -> Self {
        Self::new("client")
            .field(FieldSpec::text("name").required().max_len(100))
            .field(FieldSpec::text("email").required().email())
            .field(FieldSpec::text("phone").required().max_len(15))
    }

    /// Pawnshop client record with pledge details.
    pub fn pawnshop_client() -> Self {
        Self::new("clients")
            .field(FieldSpec::text("fio").required().max_len(150))
            .field(FieldSpec::text("phone").required().max_len(20))
            .field(FieldSpec::text("address"))
            .field(FieldSpec::text("inn").max_len(12))
            .field(FieldSpec::text("birth_date"))
            .field(FieldSpec::text("item"))
            .field(FieldSpec::real("value"))
            .field(FieldSpec::integer("term"))
    }

    /// Table name (relational) or collection label (file backends).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn spec(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == field)
    }

    /// Declared field names, excluding `id`, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|spec| spec.name.as_str())
    }

    /// Accepts `id` and every declared field as a filter or sort key.
    pub fn check_queryable(&self, field: &str) -> Result<(), ValidationError> {
        if field == ID_FIELD || self.spec(field).is_some() {
            Ok(())
        } else {
            Err(self.unknown_field(field))
        }
    }

    /// Checks a predicate's field and value type. `Null` is always allowed.
    pub fn check_predicate(&self, field: &str, value: &FieldValue) -> Result<(), ValidationError> {
        let field_type = if field == ID_FIELD {
            FieldType::Integer
        } else {
            self.spec(field)
                .ok_or_else(|| self.unknown_field(field))?
                .field_type
        };

        if field_type.accepts(value) {
            Ok(())
        } else {
            Err(ValidationError::WrongType {
                field: field.to_string(),
                expected: field_type,
                found: value.type_name(),
            })
        }
    }

    /// Validates a record passed to `add`.
    pub fn validate_new(&self, record: &Record) -> Result<(), ValidationError> {
        if record.contains(ID_FIELD) {
            return Err(ValidationError::IdNotAllowed);
        }
        self.validate_fields(record)
    }

    /// Validates a full replacement record passed to `update`.
    ///
    /// The record may carry `id` only when it equals the target id.
    pub fn validate_replacement(&self, id: RecordId, record: &Record) -> Result<(), ValidationError> {
        if let Some(found) = record.get(ID_FIELD) {
            if found.as_integer() != Some(id) {
                return Err(ValidationError::IdMismatch {
                    expected: id,
                    found: found.clone(),
                });
            }
        }
        self.validate_fields(record)
    }

    /// Produces the full declared field set, missing fields set to `Null`.
    ///
    /// The result never carries `id`.
    pub fn normalize(&self, record: &Record) -> Record {
        self.fields
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    spec.coerce(record.value_or_null(&spec.name)),
                )
            })
            .collect()
    }

    fn validate_fields(&self, record: &Record) -> Result<(), ValidationError> {
        if let Some(unknown) = record
            .field_names()
            .find(|name| *name != ID_FIELD && self.spec(name).is_none())
        {
            return Err(self.unknown_field(unknown));
        }

        for spec in &self.fields {
            spec.check(&record.value_or_null(&spec.name))?;
        }

        Ok(())
    }

    fn unknown_field(&self, field: &str) -> ValidationError {
        ValidationError::UnknownField {
            kind: self.name.clone(),
            field: field.to_string(),
        }
    }
}
