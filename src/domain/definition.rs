//! Export definitions: columns, parameter schema and typed parameter values
//!
//! Definitions are built once by the registry from configuration and then
//! only ever read. Fields are private and there are no setters.

use crate::domain::ids::ExportKey;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Output column: attribute key, display header, optional temporal format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportColumn {
    key: String,
    header: String,
    format: Option<String>,
}

impl ExportColumn {
    /// Create a column; a missing or blank header falls back to the key
    pub fn new(key: impl Into<String>, header: Option<String>, format: Option<String>) -> Self {
        let key = key.into();
        let header = header
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| key.clone());
        let format = format.filter(|f| !f.trim().is_empty());
        Self {
            key,
            header,
            format,
        }
    }

    /// Column whose header is its key and that has no format
    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, None, None)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }
}

/// Supported parameter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamType {
    String,
    Uuid,
    Int,
    Long,
    Boolean,
    Date,
    Enum,
}

impl ParamType {
    /// Coerce one raw value into a typed value
    ///
    /// Enum literals are not checked here; membership is checked against the
    /// parameter's allowed values by the validator.
    pub fn coerce(self, raw: &str) -> Result<ParamValue, String> {
        match self {
            ParamType::String => Ok(ParamValue::String(raw.to_string())),
            ParamType::Enum => Ok(ParamValue::Enum(raw.to_string())),
            ParamType::Uuid => Uuid::parse_str(raw.trim())
                .map(ParamValue::Uuid)
                .map_err(|_| format!("'{raw}' is not a valid UUID")),
            ParamType::Int => raw
                .trim()
                .parse::<i32>()
                .map(ParamValue::Int)
                .map_err(|_| format!("'{raw}' is not a valid integer")),
            ParamType::Long => raw
                .trim()
                .parse::<i64>()
                .map(ParamValue::Long)
                .map_err(|_| format!("'{raw}' is not a valid long")),
            ParamType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(ParamValue::Boolean(true)),
                "false" => Ok(ParamValue::Boolean(false)),
                _ => Err(format!("'{raw}' is not a valid boolean (expected true or false)")),
            },
            ParamType::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(ParamValue::Date)
                .map_err(|_| format!("'{raw}' is not a valid date (expected YYYY-MM-DD)")),
        }
    }
}

impl FromStr for ParamType {
    type Err = String;

    /// Case-insensitive parse of the configured type name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRING" => Ok(ParamType::String),
            "UUID" => Ok(ParamType::Uuid),
            "INT" => Ok(ParamType::Int),
            "LONG" => Ok(ParamType::Long),
            "BOOLEAN" => Ok(ParamType::Boolean),
            "DATE" => Ok(ParamType::Date),
            "ENUM" => Ok(ParamType::Enum),
            other => Err(format!(
                "Unsupported parameter type '{other}'. Must be one of: STRING, UUID, INT, LONG, BOOLEAN, DATE, ENUM"
            )),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::String => "STRING",
            ParamType::Uuid => "UUID",
            ParamType::Int => "INT",
            ParamType::Long => "LONG",
            ParamType::Boolean => "BOOLEAN",
            ParamType::Date => "DATE",
            ParamType::Enum => "ENUM",
        };
        f.write_str(name)
    }
}

/// A coerced parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    String(String),
    Uuid(Uuid),
    Int(i32),
    Long(i64),
    Boolean(bool),
    Date(NaiveDate),
    Enum(String),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) | ParamValue::Enum(s) => Some(s),
            _ => None,
        }
    }
}

/// Canonical textual form, used when forwarding parameters to remote APIs
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) | ParamValue::Enum(s) => f.write_str(s),
            ParamValue::Uuid(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Long(v) => write!(f, "{v}"),
            ParamValue::Boolean(v) => write!(f, "{v}"),
            ParamValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
    }
}

/// Declared request parameter of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportParamDefinition {
    name: String,
    param_type: ParamType,
    required: bool,
    default: Option<ParamValue>,
    enum_class: Option<String>,
    allowed_values: Vec<String>,
}

impl ExportParamDefinition {
    /// Create a parameter definition
    ///
    /// For enum parameters backed by a named enum class, `allowed_values`
    /// holds that class's literals.
    pub fn new(
        name: impl Into<String>,
        param_type: ParamType,
        required: bool,
        default: Option<ParamValue>,
        enum_class: Option<String>,
        allowed_values: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required,
            default,
            enum_class,
            allowed_values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&ParamValue> {
        self.default.as_ref()
    }

    pub fn enum_class(&self) -> Option<&str> {
        self.enum_class.as_deref()
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }
}

/// One named export
#[derive(Debug, Clone)]
pub struct ExportDefinition {
    key: ExportKey,
    description: String,
    allowed_roles: BTreeSet<String>,
    max_rows: u64,
    provider: String,
    columns: Vec<ExportColumn>,
    params: Vec<ExportParamDefinition>,
}

impl ExportDefinition {
    /// Create a definition
    ///
    /// `max_rows` is the effective ceiling, already resolved against the
    /// global default.
    pub fn new(
        key: ExportKey,
        description: impl Into<String>,
        allowed_roles: BTreeSet<String>,
        max_rows: u64,
        provider: impl Into<String>,
        columns: Vec<ExportColumn>,
        params: Vec<ExportParamDefinition>,
    ) -> Self {
        Self {
            key,
            description: description.into(),
            allowed_roles,
            max_rows,
            provider: provider.into(),
            columns,
            params,
        }
    }

    pub fn key(&self) -> &ExportKey {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Roles allowed to run the export; empty means unrestricted
    pub fn allowed_roles(&self) -> &BTreeSet<String> {
        &self.allowed_roles
    }

    pub fn max_rows(&self) -> u64 {
        self.max_rows
    }

    /// Provider handle this export was bound to
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn columns(&self) -> &[ExportColumn] {
        &self.columns
    }

    pub fn params(&self) -> &[ExportParamDefinition] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_column_header_defaults_to_key() {
        let column = ExportColumn::new("submissionId", None, None);
        assert_eq!(column.header(), "submissionId");

        let column = ExportColumn::new("submissionId", Some("  ".to_string()), None);
        assert_eq!(column.header(), "submissionId");

        let column = ExportColumn::new("submissionId", Some("Submission Id".to_string()), None);
        assert_eq!(column.header(), "Submission Id");
    }

    #[test_case("string", ParamType::String)]
    #[test_case("UUID", ParamType::Uuid)]
    #[test_case("Int", ParamType::Int)]
    #[test_case("long", ParamType::Long)]
    #[test_case("BOOLEAN", ParamType::Boolean)]
    #[test_case("date", ParamType::Date)]
    #[test_case("enum", ParamType::Enum)]
    fn test_param_type_parse(raw: &str, expected: ParamType) {
        assert_eq!(raw.parse::<ParamType>().unwrap(), expected);
    }

    #[test]
    fn test_param_type_parse_unknown() {
        let err = "DECIMAL".parse::<ParamType>().unwrap_err();
        assert!(err.contains("Unsupported parameter type 'DECIMAL'"));
    }

    #[test_case(ParamType::Int, "42", ParamValue::Int(42))]
    #[test_case(ParamType::Long, "9000000000", ParamValue::Long(9_000_000_000))]
    #[test_case(ParamType::Boolean, "TRUE", ParamValue::Boolean(true))]
    #[test_case(ParamType::Boolean, "false", ParamValue::Boolean(false))]
    #[test_case(
        ParamType::String,
        " keep spaces ",
        ParamValue::String(" keep spaces ".to_string())
    )]
    fn test_coerce_ok(param_type: ParamType, raw: &str, expected: ParamValue) {
        assert_eq!(param_type.coerce(raw).unwrap(), expected);
    }

    #[test_case(ParamType::Int, "4.2")]
    #[test_case(ParamType::Int, "3000000000")]
    #[test_case(ParamType::Long, "abc")]
    #[test_case(ParamType::Boolean, "yes")]
    #[test_case(ParamType::Uuid, "not-a-uuid")]
    #[test_case(ParamType::Date, "09/03/2024")]
    fn test_coerce_err(param_type: ParamType, raw: &str) {
        assert!(param_type.coerce(raw).is_err());
    }

    #[test]
    fn test_coerce_date_and_uuid() {
        let date = ParamType::Date.coerce("2024-03-09").unwrap();
        assert_eq!(date.to_string(), "2024-03-09");

        let id = "7d44b88c-4199-4bad-97dc-d78268e01398";
        let uuid = ParamType::Uuid.coerce(id).unwrap();
        assert_eq!(uuid.to_string(), id);
    }
}
