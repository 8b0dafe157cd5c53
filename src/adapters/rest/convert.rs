//! JSON item to row conversion
//!
//! Remote APIs send dates, instants and UUIDs as strings; each field is
//! parsed according to the attribute kind declared for the provider.

use crate::domain::{
    AttributeKind, CellValue, ExportError, Result, RowAttribute, RowSchema, SchemaRow,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Convert one JSON object into a row of `schema`
///
/// Fields absent from the object, and JSON `null`, become empty cells.
pub fn item_to_row(schema: &Arc<RowSchema>, item: Value) -> Result<SchemaRow> {
    let Value::Object(fields) = item else {
        return Err(ExportError::Remote(format!(
            "Expected a JSON object for a '{}' row, got {}",
            schema.type_name(),
            json_kind(&item)
        )));
    };

    let values = schema
        .attributes()
        .iter()
        .map(|attribute| {
            json_to_cell(fields.get(&attribute.name).unwrap_or(&Value::Null), attribute)
        })
        .collect::<Result<Vec<_>>>()?;
    SchemaRow::new(schema.clone(), values)
}

/// Convert a single JSON value to the attribute's declared kind
pub fn json_to_cell(value: &Value, attribute: &RowAttribute) -> Result<CellValue> {
    if value.is_null() {
        return Ok(CellValue::Null);
    }

    let invalid = || {
        ExportError::Remote(format!(
            "Field '{}' value {value} is not a valid {:?}",
            attribute.name, attribute.kind
        ))
    };

    let cell = match attribute.kind {
        AttributeKind::Text => match value {
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        },
        AttributeKind::Integer => match value {
            Value::Number(n) => n.as_i64().map(CellValue::Integer).ok_or_else(invalid)?,
            Value::String(s) => s.trim().parse().map(CellValue::Integer).map_err(|_| invalid())?,
            _ => return Err(invalid()),
        },
        AttributeKind::Decimal => match value {
            Value::Number(n) => n.as_f64().map(CellValue::Decimal).ok_or_else(invalid)?,
            Value::String(s) => s.trim().parse().map(CellValue::Decimal).map_err(|_| invalid())?,
            _ => return Err(invalid()),
        },
        AttributeKind::Boolean => match value {
            Value::Bool(b) => CellValue::Boolean(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => CellValue::Boolean(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => CellValue::Boolean(false),
            _ => return Err(invalid()),
        },
        AttributeKind::Uuid => {
            let s = value.as_str().ok_or_else(invalid)?;
            Uuid::parse_str(s).map(CellValue::Uuid).map_err(|_| invalid())?
        }
        AttributeKind::Date => {
            let s = value.as_str().ok_or_else(invalid)?;
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(CellValue::Date)
                .map_err(|_| invalid())?
        }
        AttributeKind::DateTime => {
            let s = value.as_str().ok_or_else(invalid)?;
            s.parse::<NaiveDateTime>()
                .map(CellValue::DateTime)
                .map_err(|_| invalid())?
        }
        AttributeKind::Time => {
            let s = value.as_str().ok_or_else(invalid)?;
            s.parse::<NaiveTime>().map(CellValue::Time).map_err(|_| invalid())?
        }
        AttributeKind::Instant => match value {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| CellValue::Instant(dt.with_timezone(&Utc)))
                .map_err(|_| invalid())?,
            // Epoch milliseconds
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(CellValue::Instant)
                .ok_or_else(invalid)?,
            _ => return Err(invalid()),
        },
        AttributeKind::OffsetDateTime => {
            let s = value.as_str().ok_or_else(invalid)?;
            DateTime::parse_from_rfc3339(s)
                .map(CellValue::OffsetDateTime)
                .map_err(|_| invalid())?
        }
    };
    Ok(cell)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExportRow;
    use chrono::TimeZone;
    use serde_json::json;
    use test_case::test_case;

    fn attr(kind: AttributeKind) -> RowAttribute {
        RowAttribute::new("field", kind)
    }

    #[test_case(json!("x"), AttributeKind::Text, CellValue::from("x"); "text")]
    #[test_case(json!(42), AttributeKind::Text, CellValue::from("42"); "number as text")]
    #[test_case(json!(42), AttributeKind::Integer, CellValue::Integer(42); "integer")]
    #[test_case(json!("17"), AttributeKind::Integer, CellValue::Integer(17); "integer from string")]
    #[test_case(json!(1.5), AttributeKind::Decimal, CellValue::Decimal(1.5); "decimal")]
    #[test_case(
        json!("TRUE"), AttributeKind::Boolean, CellValue::Boolean(true); "boolean from string"
    )]
    #[test_case(json!(null), AttributeKind::Date, CellValue::Null; "null")]
    fn test_json_to_cell(value: Value, kind: AttributeKind, expected: CellValue) {
        assert_eq!(json_to_cell(&value, &attr(kind)).unwrap(), expected);
    }

    #[test]
    fn test_temporal_strings() {
        let date = json_to_cell(&json!("2024-03-09"), &attr(AttributeKind::Date)).unwrap();
        assert_eq!(date, CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()));

        let instant = json_to_cell(
            &json!("2024-03-09T11:30:00+01:00"),
            &attr(AttributeKind::Instant),
        )
        .unwrap();
        assert_eq!(
            instant,
            CellValue::Instant(Utc.with_ymd_and_hms(2024, 3, 9, 10, 30, 0).unwrap())
        );

        let millis = json_to_cell(&json!(0), &attr(AttributeKind::Instant)).unwrap();
        assert_eq!(millis, CellValue::Instant(Utc.timestamp_opt(0, 0).unwrap()));

        let local =
            json_to_cell(&json!("2024-03-09T08:05:00"), &attr(AttributeKind::DateTime)).unwrap();
        assert_eq!(local.to_string(), "2024-03-09T08:05:00");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            json_to_cell(&json!("not-a-uuid"), &attr(AttributeKind::Uuid)),
            Err(ExportError::Remote(_))
        ));
        assert!(json_to_cell(&json!("09/03/2024"), &attr(AttributeKind::Date)).is_err());
        assert!(json_to_cell(&json!({"a": 1}), &attr(AttributeKind::Integer)).is_err());
    }

    #[test]
    fn test_item_to_row() {
        let schema = Arc::new(
            RowSchema::new(
                "ClaimRow",
                vec![
                    RowAttribute::new("submissionId", AttributeKind::Text),
                    RowAttribute::new("amount", AttributeKind::Integer),
                ],
            )
            .unwrap(),
        );

        let row = item_to_row(&schema, json!({"submissionId": "A-1", "ignored": true})).unwrap();
        assert_eq!(row.value("submissionId"), Some(CellValue::from("A-1")));
        assert_eq!(row.value("amount"), Some(CellValue::Null));

        assert!(item_to_row(&schema, json!(["A-1"])).is_err());
    }
}
