//! Cell formatting

use crate::domain::{AttributeKind, CellValue, ExportError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt::Write;

/// Check that a column format can render values of `kind`
///
/// Only temporal kinds take a pattern. The pattern must be valid strftime
/// and must not ask for fields the kind lacks, e.g. `%H` on a date.
pub fn validate_pattern(pattern: &str, kind: AttributeKind) -> std::result::Result<(), String> {
    if !kind.is_temporal() {
        return Err(format!(
            "format pattern '{pattern}' given for non-temporal attribute of kind {kind:?}"
        ));
    }
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(format!("Invalid date/time format pattern '{pattern}'"));
    }
    format_cell(&sample_value(kind), Some(pattern))
        .map(|_| ())
        .map_err(|_| format!("format pattern '{pattern}' cannot render {kind:?} values"))
}

fn sample_value(kind: AttributeKind) -> CellValue {
    match kind {
        AttributeKind::Date => CellValue::Date(NaiveDate::default()),
        AttributeKind::DateTime => CellValue::DateTime(NaiveDateTime::default()),
        AttributeKind::Time => CellValue::Time(NaiveTime::default()),
        AttributeKind::Instant => CellValue::Instant(DateTime::<Utc>::default()),
        AttributeKind::OffsetDateTime => {
            CellValue::OffsetDateTime(DateTime::<FixedOffset>::default())
        }
        _ => CellValue::Null,
    }
}

/// Render a value as cell text
///
/// A pattern only applies to temporal values. Instants are rendered in UTC
/// and offset date-times in their own offset. Everything else uses its
/// natural form, and null renders as an empty string.
pub fn format_cell(value: &CellValue, pattern: Option<&str>) -> Result<String> {
    let Some(pattern) = pattern else {
        return Ok(value.to_string());
    };

    let mut out = String::new();
    let written = match value {
        CellValue::Date(v) => write!(out, "{}", v.format(pattern)),
        CellValue::DateTime(v) => write!(out, "{}", v.format(pattern)),
        CellValue::Time(v) => write!(out, "{}", v.format(pattern)),
        CellValue::Instant(v) => write!(out, "{}", v.format(pattern)),
        CellValue::OffsetDateTime(v) => write!(out, "{}", v.format(pattern)),
        other => return Ok(other.to_string()),
    };
    written.map_err(|_| {
        ExportError::Serialization(format!(
            "Format pattern '{pattern}' cannot be applied to value {value:?}"
        ))
    })?;
    Ok(out)
}
