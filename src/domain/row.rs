//! Row model shared by providers and the CSV writer
//!
//! A provider declares a [`RowSchema`]: the stable, ordered list of named,
//! typed attributes its rows expose. Rows themselves implement [`ExportRow`],
//! which reads one attribute by name as a [`CellValue`]. The writer resolves
//! columns against the schema, never against the concrete row type.

use crate::domain::{ExportError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Declared type of a row attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Free text
    Text,
    /// Signed integer
    Integer,
    /// Floating point number
    Decimal,
    /// true/false
    Boolean,
    /// UUID
    Uuid,
    /// Calendar date without time zone
    Date,
    /// Date and time without time zone
    #[serde(rename = "datetime")]
    DateTime,
    /// Time of day
    Time,
    /// Absolute point in time, rendered in UTC
    Instant,
    /// Date and time with a fixed UTC offset
    #[serde(rename = "offset_datetime")]
    OffsetDateTime,
}

impl AttributeKind {
    /// Whether a column format pattern applies to values of this kind
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            AttributeKind::Date
                | AttributeKind::DateTime
                | AttributeKind::Time
                | AttributeKind::Instant
                | AttributeKind::OffsetDateTime
        )
    }
}

/// One named attribute of a row type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAttribute {
    /// Attribute name, matched against column keys
    pub name: String,

    /// Declared value kind
    #[serde(rename = "type")]
    pub kind: AttributeKind,
}

impl RowAttribute {
    /// Create a new attribute descriptor
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered attribute list of a row type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    type_name: String,
    attributes: Vec<RowAttribute>,
}

impl RowSchema {
    /// Create a schema, rejecting blank or duplicate attribute names
    pub fn new(type_name: impl Into<String>, attributes: Vec<RowAttribute>) -> Result<Self> {
        let type_name = type_name.into();
        for (idx, attribute) in attributes.iter().enumerate() {
            if attribute.name.trim().is_empty() {
                return Err(ExportError::Configuration(format!(
                    "Row type '{type_name}' declares an attribute with a blank name"
                )));
            }
            if attributes[..idx].iter().any(|a| a.name == attribute.name) {
                return Err(ExportError::Configuration(format!(
                    "Row type '{type_name}' declares attribute '{}' more than once",
                    attribute.name
                )));
            }
        }
        Ok(Self {
            type_name,
            attributes,
        })
    }

    /// Name of the row type, used in logs and error messages
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Attributes in declared order
    pub fn attributes(&self) -> &[RowAttribute] {
        &self.attributes
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&RowAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Position of an attribute in declared order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// A single attribute value read from a row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Instant(DateTime<Utc>),
    OffsetDateTime(DateTime<FixedOffset>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// Natural textual form of a value; `Null` renders as an empty string
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(v) => write!(f, "{v}"),
            CellValue::Decimal(v) => write!(f, "{v}"),
            CellValue::Boolean(v) => write!(f, "{v}"),
            CellValue::Uuid(v) => write!(f, "{v}"),
            CellValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            CellValue::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            CellValue::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            CellValue::Instant(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            CellValue::OffsetDateTime(v) => {
                f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<Uuid> for CellValue {
    fn from(value: Uuid) -> Self {
        CellValue::Uuid(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::Instant(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// A row produced by a provider
///
/// `value` returns `None` when the row type has no attribute with that name,
/// and `Some(CellValue::Null)` when the attribute exists but is empty.
pub trait ExportRow: Send + Sync {
    fn value(&self, attribute: &str) -> Option<CellValue>;
}

/// Row backed by a shared schema and a positional value vector
///
/// This is the row representation used by the configuration-driven
/// providers, which only know their row type through declared attributes.
#[derive(Debug, Clone)]
pub struct SchemaRow {
    schema: Arc<RowSchema>,
    values: Vec<CellValue>,
}

impl SchemaRow {
    /// Create a row; `values` must line up with the schema's attributes
    pub fn new(schema: Arc<RowSchema>, values: Vec<CellValue>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(ExportError::Provider(format!(
                "Row of type '{}' has {} values but the type declares {} attributes",
                schema.type_name(),
                values.len(),
                schema.len()
            )));
        }
        Ok(Self { schema, values })
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

impl ExportRow for SchemaRow {
    fn value(&self, attribute: &str) -> Option<CellValue> {
        self.schema
            .position(attribute)
            .map(|idx| self.values[idx].clone())
    }
}
