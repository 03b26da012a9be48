//! Per-entity configuration injected into the generic repository.
//!
//! Each entity describes its table once: the select list, which API fields
//! map to which columns, and what may be searched, filtered, or sorted.
//! Field names coming from requests are only ever resolved through this
//! map, never interpolated into SQL.

use academy_core::types::Timestamp;

use crate::error::{RepoError, RepoResult};

/// Maps one API field to its column.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub field: &'static str,
    pub column: &'static str,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
}

impl FieldMap {
    pub const fn new(field: &'static str, column: &'static str) -> Self {
        Self {
            field,
            column,
            searchable: false,
            filterable: false,
            sortable: false,
        }
    }

    pub const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EntityConfig {
    /// Display name used in errors and logs (e.g. `"Training"`).
    pub entity: &'static str,
    pub table: &'static str,
    /// Comma-separated select list matching the entity's `FromRow` impl.
    pub columns: &'static str,
    pub fields: &'static [FieldMap],
    /// Soft-delete marker column. `None` means deletes remove rows.
    pub soft_delete: Option<&'static str>,
}

impl EntityConfig {
    /// Resolve an API field name (or a raw column name) to its mapping.
    pub fn field(&self, name: &str) -> Option<&FieldMap> {
        self.fields
            .iter()
            .find(|f| f.field == name || f.column == name)
    }

    pub fn lookup_column(&self, name: &str) -> RepoResult<&'static str> {
        self.field(name)
            .map(|f| f.column)
            .ok_or_else(|| self.unknown(name))
    }

    pub fn filter_column(&self, name: &str) -> RepoResult<&'static str> {
        self.field(name)
            .filter(|f| f.filterable)
            .map(|f| f.column)
            .ok_or_else(|| self.unknown(name))
    }

    pub fn sort_column(&self, name: &str) -> RepoResult<&'static str> {
        self.field(name)
            .filter(|f| f.sortable)
            .map(|f| f.column)
            .ok_or_else(|| self.unknown(name))
    }

    pub fn search_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.searchable).map(|f| f.column)
    }

    fn unknown(&self, name: &str) -> RepoError {
        RepoError::UnknownField {
            entity: self.entity,
            field: name.to_string(),
        }
    }
}

/// A typed value bound into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    BigInt(Option<i64>),
    Int(Option<i32>),
    Double(Option<f64>),
    Bool(Option<bool>),
    Timestamp(Option<Timestamp>),
    Json(Option<serde_json::Value>),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        match self {
            ColumnValue::Text(v) => v.is_none(),
            ColumnValue::BigInt(v) => v.is_none(),
            ColumnValue::Int(v) => v.is_none(),
            ColumnValue::Double(v) => v.is_none(),
            ColumnValue::Bool(v) => v.is_none(),
            ColumnValue::Timestamp(v) => v.is_none(),
            ColumnValue::Json(v) => v.is_none(),
        }
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(Some(value))
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(Some(value.to_string()))
    }
}

impl From<Option<String>> for ColumnValue {
    fn from(value: Option<String>) -> Self {
        ColumnValue::Text(value)
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::BigInt(Some(value))
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        ColumnValue::Int(Some(value))
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        ColumnValue::Double(Some(value))
    }
}

impl From<Option<f64>> for ColumnValue {
    fn from(value: Option<f64>) -> Self {
        ColumnValue::Double(value)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        ColumnValue::Bool(Some(value))
    }
}

impl From<Timestamp> for ColumnValue {
    fn from(value: Timestamp) -> Self {
        ColumnValue::Timestamp(Some(value))
    }
}

impl From<Option<Timestamp>> for ColumnValue {
    fn from(value: Option<Timestamp>) -> Self {
        ColumnValue::Timestamp(value)
    }
}

impl From<serde_json::Value> for ColumnValue {
    fn from(value: serde_json::Value) -> Self {
        ColumnValue::Json(Some(value))
    }
}

/// A column name paired with the value to write or compare.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub value: ColumnValue,
}

impl Column {
    pub fn new(name: &'static str, value: impl Into<ColumnValue>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Converts a DTO into the columns it writes.
///
/// Update DTOs emit only the fields that are present, which is what gives
/// updates their partial semantics.
pub trait IntoColumns {
    fn into_columns(&self) -> Vec<Column>;
}

/// A DTO carrying a secret that must be transformed (hashed) before storage.
pub trait HasSecret {
    fn secret_mut(&mut self) -> Option<&mut String>;
}
