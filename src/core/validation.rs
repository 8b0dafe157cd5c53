//! Request validation
//!
//! Turns raw, string-keyed and possibly multi-valued parameters into a typed
//! [`ValidatedExportRequest`] bound to one export definition.

use crate::domain::{
    ExportDefinition, ExportError, ExportParamDefinition, ParamValue, RawParams, Result,
    ValidatedExportRequest,
};
use std::collections::BTreeMap;

/// Validates raw request parameters against a definition's parameter schema
///
/// Rules, applied per declared parameter:
/// - absent (or blank) and required without a default: error
/// - absent and optional: the default, or left unset
/// - present: the first raw value is coerced to the declared type, and must
///   match one of the allowed values exactly when any are declared
///
/// Raw parameters the definition doesn't declare are ignored. The request's
/// row ceiling is always the definition's.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestValidator;

impl RequestValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        definition: &ExportDefinition,
        raw: &RawParams,
    ) -> Result<ValidatedExportRequest> {
        let mut values = BTreeMap::new();

        for param in definition.params() {
            if let Some(value) = validate_param(param, raw)? {
                values.insert(param.name().to_string(), value);
            }
        }

        Ok(ValidatedExportRequest::new(
            definition.key().clone(),
            values,
            definition.max_rows(),
        ))
    }
}

fn validate_param(param: &ExportParamDefinition, raw: &RawParams) -> Result<Option<ParamValue>> {
    let supplied = raw.first(param.name()).filter(|v| !v.trim().is_empty());

    let Some(value) = supplied else {
        return match param.default_value() {
            Some(default) => Ok(Some(default.clone())),
            None if param.required() => Err(ExportError::validation(param.name(), "is required")),
            None => Ok(None),
        };
    };

    if !param.allowed_values().is_empty() && !param.allowed_values().iter().any(|a| a == value) {
        return Err(ExportError::validation(
            param.name(),
            format!(
                "'{value}' is not allowed (expected one of: {})",
                param.allowed_values().join(", ")
            ),
        ));
    }

    param
        .param_type()
        .coerce(value)
        .map(Some)
        .map_err(|reason| ExportError::validation(param.name(), reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExportKey, ParamType};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;
    use test_case::test_case;
    use uuid::Uuid;

    fn definition(params: Vec<ExportParamDefinition>) -> ExportDefinition {
        ExportDefinition::new(
            ExportKey::new("claims").unwrap(),
            "Claims",
            BTreeSet::new(),
            25,
            "claims_db",
            Vec::new(),
            params,
        )
    }

    fn optional(name: &str, ty: ParamType) -> ExportParamDefinition {
        ExportParamDefinition::new(name, ty, false, None, None, Vec::new())
    }

    fn required(name: &str, ty: ParamType) -> ExportParamDefinition {
        ExportParamDefinition::new(name, ty, true, None, None, Vec::new())
    }

    fn expect_validation_error(result: Result<ValidatedExportRequest>, parameter: &str) -> String {
        match result {
            Err(ExportError::Validation { parameter: p, reason }) => {
                assert_eq!(p, parameter);
                reason
            }
            Err(other) => panic!("expected validation error, got {other}"),
            Ok(_) => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_missing_required_names_parameter() {
        let definition = definition(vec![required("office", ParamType::String)]);
        let result = RequestValidator.validate(&definition, &RawParams::new());
        let reason = expect_validation_error(result, "office");
        assert!(reason.contains("required"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let definition = definition(vec![required("office", ParamType::String)]);
        let raw: RawParams = [("office", "  ")].into_iter().collect();
        expect_validation_error(RequestValidator.validate(&definition, &raw), "office");
    }

    #[test]
    fn test_required_with_default_uses_default() {
        let definition = definition(vec![ExportParamDefinition::new(
            "limit",
            ParamType::Int,
            true,
            Some(ParamValue::Int(10)),
            None,
            Vec::new(),
        )]);
        let request = RequestValidator
            .validate(&definition, &RawParams::new())
            .unwrap();
        assert_eq!(request.get("limit"), Some(&ParamValue::Int(10)));
    }

    #[test]
    fn test_optional_without_default_is_unset() {
        let definition = definition(vec![optional("office", ParamType::String)]);
        let request = RequestValidator
            .validate(&definition, &RawParams::new())
            .unwrap();
        assert!(request.params().is_empty());
    }

    #[test]
    fn test_first_value_wins_and_unknown_ignored() {
        let definition = definition(vec![optional("limit", ParamType::Long)]);
        let raw: RawParams = [("limit", "5"), ("limit", "900"), ("max_rows", "1000000")]
            .into_iter()
            .collect();

        let request = RequestValidator.validate(&definition, &raw).unwrap();
        assert_eq!(request.get("limit"), Some(&ParamValue::Long(5)));
        assert_eq!(request.get("max_rows"), None);
        assert_eq!(request.max_rows(), 25);
        assert_eq!(request.export_key().as_str(), "claims");
    }

    #[test_case(ParamType::Uuid, "not-a-uuid"; "uuid")]
    #[test_case(ParamType::Int, "3000000000"; "int overflow")]
    #[test_case(ParamType::Long, "12x"; "long")]
    #[test_case(ParamType::Date, "09/03/2024"; "date")]
    #[test_case(ParamType::Boolean, "yes"; "boolean")]
    fn test_coercion_failures(ty: ParamType, raw: &str) {
        let definition = definition(vec![optional("p", ty)]);
        let raw: RawParams = [("p", raw)].into_iter().collect();
        expect_validation_error(RequestValidator.validate(&definition, &raw), "p");
    }

    #[test]
    fn test_typed_values() {
        let id = Uuid::new_v4();
        let definition = definition(vec![
            optional("id", ParamType::Uuid),
            optional("from", ParamType::Date),
            optional("active", ParamType::Boolean),
        ]);
        let id_text = id.to_string();
        let raw: RawParams = [
            ("id", id_text.as_str()),
            ("from", "2024-03-09"),
            ("active", "TRUE"),
        ]
        .into_iter()
        .collect();

        let request = RequestValidator.validate(&definition, &raw).unwrap();
        assert_eq!(request.get("id"), Some(&ParamValue::Uuid(id)));
        assert_eq!(
            request.get("from"),
            Some(&ParamValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()))
        );
        assert_eq!(request.get("active"), Some(&ParamValue::Boolean(true)));
    }

    #[test]
    fn test_enum_match_is_case_sensitive() {
        let definition = definition(vec![ExportParamDefinition::new(
            "status",
            ParamType::Enum,
            false,
            None,
            Some("ClaimStatus".into()),
            vec!["READY".into(), "SUBMITTED".into()],
        )]);

        let raw: RawParams = [("status", "READY")].into_iter().collect();
        let request = RequestValidator.validate(&definition, &raw).unwrap();
        assert_eq!(request.get("status"), Some(&ParamValue::Enum("READY".into())));

        let raw: RawParams = [("status", "ready")].into_iter().collect();
        let result = RequestValidator.validate(&definition, &raw);
        let reason = expect_validation_error(result, "status");
        assert!(reason.contains("not allowed"));
    }

    #[test]
    fn test_allowed_values_on_string_param() {
        let definition = definition(vec![ExportParamDefinition::new(
            "office",
            ParamType::String,
            false,
            None,
            None,
            vec!["LDN".into(), "MAN".into()],
        )]);
        let raw: RawParams = [("office", "BRS")].into_iter().collect();
        expect_validation_error(RequestValidator.validate(&definition, &raw), "office");
    }
}
