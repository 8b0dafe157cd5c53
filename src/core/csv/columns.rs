//! Column resolution against a row schema

use crate::domain::{ExportColumn, ExportError, Result, RowSchema};

/// Resolve the effective column list for a row type
///
/// - No columns: every attribute in declared order, key as header.
/// - At least as many columns as attributes: the list is used unchanged.
/// - Fewer columns: attributes are walked in declared order, taking the
///   caller's column where one exists and a plain column otherwise.
///
/// Every column key must name an attribute of the schema.
pub fn resolve_columns(schema: &RowSchema, columns: &[ExportColumn]) -> Result<Vec<ExportColumn>> {
    if let Some(unknown) = columns.iter().find(|c| schema.attribute(c.key()).is_none()) {
        return Err(ExportError::Configuration(format!(
            "Column '{}' is not an attribute of row type '{}'",
            unknown.key(),
            schema.type_name()
        )));
    }

    if columns.len() >= schema.len() {
        return Ok(columns.to_vec());
    }

    let resolved = schema
        .attributes()
        .iter()
        .map(|attribute| {
            columns
                .iter()
                .find(|c| c.key() == attribute.name)
                .cloned()
                .unwrap_or_else(|| ExportColumn::plain(&attribute.name))
        })
        .collect();
    Ok(resolved)
}
