//! Request body validation with `validator`, reported as `Unprocessable`
//! with per-field messages.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use cms_core::CmsError;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{map_json_rejection, CmsAxumError};

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "email" => Some("must be a valid email"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        "regex" => Some("has an invalid format"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn push_errors(out: &mut Map<String, Value>, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        let key = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors.iter().map(|e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(str::to_string))
                        .unwrap_or_else(|| e.code.to_string());
                    Value::String(msg)
                });
                match out.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
                    Value::Array(list) => list.extend(messages),
                    other => *other = Value::Array(messages.collect()),
                }
            }
            ValidationErrorsKind::Struct(nested) => push_errors(out, &key, nested),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    push_errors(out, &format!("{key}[{idx}]"), nested);
                }
            }
        }
    }
}

/// Validate an already-deserialized value.
pub fn validate_value<T: Validate>(value: &T, error_message: &str) -> Result<(), CmsError> {
    value.validate().map_err(|errs| {
        let mut out = Map::new();
        push_errors(&mut out, "", &errs);
        CmsError::unprocessable(error_message).with_errors(Value::Object(out))
    })
}

/// Deserialize and validate a JSON value.
pub fn validate<T>(data: Value, error_message: &str) -> Result<T, CmsError>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data).map_err(|e| {
        CmsError::unprocessable(error_message).with_errors(json!({"_schema": [e.to_string()]}))
    })?;
    validate_value(&parsed, error_message)?;
    Ok(parsed)
}

/// Unwrap an axum JSON body and validate it.
///
/// Malformed JSON is a 400; well-formed JSON of the wrong shape or with
/// invalid fields is a 422.
pub fn validated_body<T>(
    body: Result<Json<Value>, JsonRejection>,
    error_message: &str,
) -> Result<T, CmsAxumError>
where
    T: DeserializeOwned + Validate,
{
    let Json(data) = body.map_err(map_json_rejection)?;
    Ok(validate(data, error_message)?)
}

#[cfg(test)]
mod tests {
    use cms_core::ErrorKind;
    use serde::Deserialize;
    use validator::Validate;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Input {
        #[validate(length(min = 1, message = "name must not be empty"))]
        name: String,
        #[validate(length(min = 3))]
        phone: String,
    }

    #[test]
    fn field_errors_are_collected_per_field() {
        let err = validate::<Input>(json!({"name": "", "phone": "1"}), "Invalid contact").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unprocessable);
        let errors = err.errors.unwrap();
        assert_eq!(errors["name"], json!(["name must not be empty"]));
        assert_eq!(errors["phone"], json!(["has invalid length"]));
    }

    #[test]
    fn wrong_shape_is_reported_under_schema() {
        let err = validate::<Input>(json!({"name": 5}), "Invalid contact").unwrap_err();
        assert!(err.errors.unwrap().get("_schema").is_some());
    }
}
