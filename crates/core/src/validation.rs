//! Parameter validation against an [`ObjectSchema`].
//!
//! Validation is a pure function of `(schema, input)`. It never stops at the
//! first problem: every violated field is reported so a caller can fix all of
//! them in one round trip.

use crate::error::{Rule, ValidationError, Violation};
use crate::schema::{FieldKind, FieldSchema, ObjectSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Arguments that passed validation, with defaults applied.
///
/// The key set is exactly the schema's fields that were either supplied or
/// defaulted; unknown keys never survive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedParams(Map<String, Value>);

impl ValidatedParams {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn u64(&self, name: &str) -> Option<u64> {
        self.0.get(name).and_then(Value::as_u64)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    /// Identifier that the schema guarantees to be present.
    pub fn require_u64(&self, name: &str) -> Result<u64, ValidationError> {
        self.u64(name).ok_or_else(|| {
            ValidationError::single(Violation::new(name, Rule::Missing, "is required"))
        })
    }

    /// Free-form object (or any value) stored under `name`.
    pub fn require_value(&self, name: &str) -> Result<Value, ValidationError> {
        self.0.get(name).cloned().ok_or_else(|| {
            ValidationError::single(Violation::new(name, Rule::Missing, "is required"))
        })
    }

    /// Deserialize into a typed parameter struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            ValidationError::single(Violation::new("", Rule::WrongType, e.to_string()))
        })
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Validate a raw argument bag. `None` and JSON `null` mean "no arguments".
pub fn validate(schema: &ObjectSchema, args: Option<&Value>) -> Result<ValidatedParams, ValidationError> {
    let empty = Map::new();
    let object = match args {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ValidationError::single(Violation::new(
                "",
                Rule::WrongType,
                format!("arguments must be an object, got {}", json_type(other)),
            )))
        }
    };

    let mut violations = Vec::new();
    let params = check_object(schema, object, "", &mut violations);

    if violations.is_empty() {
        Ok(ValidatedParams(params))
    } else {
        Err(ValidationError::new(violations))
    }
}

fn check_object(
    schema: &ObjectSchema,
    input: &Map<String, Value>,
    prefix: &str,
    violations: &mut Vec<Violation>,
) -> Map<String, Value> {
    let mut out = Map::new();

    for field in &schema.fields {
        let path = join_path(prefix, field.name);
        match input.get(field.name) {
            None => {
                if let Some(default) = &field.default {
                    out.insert(field.name.to_string(), default.clone());
                } else if field.required {
                    violations.push(Violation::new(path, Rule::Missing, "is required"));
                }
            }
            Some(value) => {
                if let Some(value) = check_field(field, value, &path, violations) {
                    out.insert(field.name.to_string(), value);
                }
            }
        }
    }

    out
}

/// Returns the normalized value, or `None` when the type itself is wrong.
fn check_field(
    field: &FieldSchema,
    value: &Value,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Option<Value> {
    let normalized = match (&field.kind, value) {
        (FieldKind::Integer, Value::Number(n)) => {
            let Some(int) = as_integer(n) else {
                violations.push(wrong_type(path, field, value));
                return None;
            };
            check_bounds(field, int as f64, path, violations);
            Value::from(int)
        }
        (FieldKind::Number, Value::Number(n)) => {
            let float = n.as_f64().unwrap_or(f64::NAN);
            check_bounds(field, float, path, violations);
            value.clone()
        }
        (FieldKind::String, Value::String(s)) => {
            check_string(field, s, path, violations);
            value.clone()
        }
        (FieldKind::Enum(allowed), Value::String(s)) => {
            if !allowed.contains(&s.as_str()) {
                violations.push(Violation::new(
                    path,
                    Rule::Enum,
                    format!("must be one of: {}", allowed.join(", ")),
                ));
            }
            value.clone()
        }
        (FieldKind::Boolean, Value::Bool(_)) => value.clone(),
        (FieldKind::Object(schema), Value::Object(map)) => {
            Value::Object(check_object(schema, map, path, violations))
        }
        (FieldKind::Record, Value::Object(_)) => value.clone(),
        (FieldKind::Array(items), Value::Array(values)) => Value::Array(
            values
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    check_field(items, item, &format!("{}[{}]", path, i), violations)
                })
                .collect(),
        ),
        (FieldKind::Scalar, Value::String(_) | Value::Number(_) | Value::Bool(_)) => value.clone(),
        (FieldKind::Any, _) => value.clone(),
        _ => {
            violations.push(wrong_type(path, field, value));
            return None;
        }
    };

    Some(normalized)
}

/// Integral JSON numbers, including `5.0`. Textual numbers never get here.
fn as_integer(n: &serde_json::Number) -> Option<i64> {
    if let Some(int) = n.as_i64() {
        return Some(int);
    }
    let float = n.as_f64()?;
    if float.fract() == 0.0 && float >= i64::MIN as f64 && float <= i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

fn check_bounds(field: &FieldSchema, value: f64, path: &str, violations: &mut Vec<Violation>) {
    if let Some(min) = field.minimum {
        if value < min {
            violations.push(Violation::new(
                path,
                Rule::Minimum,
                format!("must be at least {}", format_number(min)),
            ));
        }
    }
    if let Some(min) = field.exclusive_minimum {
        if value <= min {
            violations.push(Violation::new(
                path,
                Rule::ExclusiveMinimum,
                format!("must be greater than {}", format_number(min)),
            ));
        }
    }
    if let Some(max) = field.maximum {
        if value > max {
            violations.push(Violation::new(
                path,
                Rule::Maximum,
                format!("must be at most {}", format_number(max)),
            ));
        }
    }
}

fn check_string(field: &FieldSchema, value: &str, path: &str, violations: &mut Vec<Violation>) {
    let chars = value.chars().count();

    if let Some(length) = field.length {
        if chars != length {
            violations.push(Violation::new(
                path,
                Rule::Length,
                format!("must be exactly {} characters, got {}", length, chars),
            ));
        }
    }
    if let Some(min) = field.min_length {
        if chars < min {
            violations.push(Violation::new(
                path,
                Rule::MinLength,
                format!("must be at least {} characters", min),
            ));
        }
    }
    if let Some(max) = field.max_length {
        if chars > max {
            violations.push(Violation::new(
                path,
                Rule::MaxLength,
                format!("must be at most {} characters", max),
            ));
        }
    }
    if let Some(pattern) = field.pattern {
        if !pattern.is_match(value) {
            violations.push(Violation::new(path, Rule::Pattern, pattern.message()));
        }
    }
}

fn wrong_type(path: &str, field: &FieldSchema, value: &Value) -> Violation {
    Violation::new(
        path,
        Rule::WrongType,
        format!("expected {}, got {}", field.kind.type_name(), json_type(value)),
    )
}

fn join_path(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{}.{}", prefix, name),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{date, id, limit, offset, FieldSchema, Pattern};
    use serde_json::json;

    fn list_schema() -> ObjectSchema {
        ObjectSchema::new(vec![limit(50), offset()])
    }

    fn create_project_schema() -> ObjectSchema {
        ObjectSchema::new(vec![
            id("user_id", "Owner"),
            FieldSchema::string("name", "Project name").min_len(1),
            date("start_date", "Start date").optional(),
            FieldSchema::one_of("kind", "Kind", &["internal", "customer"]).default("customer"),
        ])
    }

    #[test]
    fn test_defaults_applied_when_absent() {
        let params = validate(&list_schema(), None).unwrap();
        assert_eq!(params.u64("limit"), Some(50));
        assert_eq!(params.u64("offset"), Some(0));

        let params = validate(&list_schema(), Some(&json!({"limit": 10}))).unwrap();
        assert_eq!(params.u64("limit"), Some(10));
        assert_eq!(params.u64("offset"), Some(0));
    }

    #[test]
    fn test_null_root_is_absent() {
        let params = validate(&list_schema(), Some(&Value::Null)).unwrap();
        assert_eq!(params.u64("limit"), Some(50));
    }

    #[test]
    fn test_present_null_is_not_defaulted() {
        let err = validate(&list_schema(), Some(&json!({"limit": null}))).unwrap_err();
        assert!(err.has("limit", Rule::WrongType));
    }

    #[test]
    fn test_missing_required_field() {
        let schema = ObjectSchema::new(vec![id("invoice_id", "The invoice ID")]);
        let err = validate(&schema, Some(&json!({}))).unwrap_err();

        assert_eq!(err.violations.len(), 1);
        assert!(err.has("invoice_id", Rule::Missing));
    }

    #[test]
    fn test_collects_every_violation() {
        let err = validate(
            &create_project_schema(),
            Some(&json!({
                "name": "",
                "start_date": "01.02.2024",
                "kind": "partner"
            })),
        )
        .unwrap_err();

        assert_eq!(err.violations.len(), 4);
        assert!(err.has("user_id", Rule::Missing));
        assert!(err.has("name", Rule::MinLength));
        assert!(err.has("start_date", Rule::Pattern));
        assert!(err.has("kind", Rule::Enum));
    }

    #[test]
    fn test_textual_integers_are_rejected() {
        let schema = ObjectSchema::new(vec![id("invoice_id", "The invoice ID")]);
        let err = validate(&schema, Some(&json!({"invoice_id": "42"}))).unwrap_err();

        assert!(err.has("invoice_id", Rule::WrongType));
        assert_eq!(err.violations[0].message, "expected integer, got string");
    }

    #[test]
    fn test_fractional_number_is_not_an_integer() {
        let schema = ObjectSchema::new(vec![id("invoice_id", "The invoice ID")]);
        let err = validate(&schema, Some(&json!({"invoice_id": 4.5}))).unwrap_err();
        assert!(err.has("invoice_id", Rule::WrongType));

        let params = validate(&schema, Some(&json!({"invoice_id": 4.0}))).unwrap();
        assert_eq!(params.get("invoice_id"), Some(&json!(4)));
    }

    #[test]
    fn test_numeric_bounds() {
        let err = validate(&list_schema(), Some(&json!({"limit": 0, "offset": -1}))).unwrap_err();
        assert!(err.has("limit", Rule::Minimum));
        assert!(err.has("offset", Rule::Minimum));

        let err = validate(&list_schema(), Some(&json!({"limit": 5000}))).unwrap_err();
        assert!(err.has("limit", Rule::Maximum));
        assert_eq!(err.violations[0].message, "must be at most 2000");
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let params = validate(&list_schema(), Some(&json!({"limit": 5, "page": 3}))).unwrap();
        assert!(params.get("page").is_none());
        assert_eq!(params.as_map().len(), 2);
    }

    #[test]
    fn test_non_object_arguments() {
        let err = validate(&list_schema(), Some(&json!([1, 2]))).unwrap_err();
        assert!(err.has("", Rule::WrongType));
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let schema = create_project_schema();
        let first = validate(
            &schema,
            Some(&json!({"user_id": 3.0, "name": "Website", "extra": true})),
        )
        .unwrap();
        let second = validate(&schema, Some(&first.clone().into_value())).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.str("kind"), Some("customer"));
    }

    #[test]
    fn test_nested_object_paths() {
        let schema = ObjectSchema::new(vec![FieldSchema::object(
            "item_data",
            "Item data",
            ObjectSchema::new(vec![
                FieldSchema::string("name_1", "Name"),
                FieldSchema::number("sale_price", "Price").optional(),
            ]),
        )]);

        let err = validate(&schema, Some(&json!({"item_data": {"sale_price": "9.90"}}))).unwrap_err();
        assert!(err.has("item_data.name_1", Rule::Missing));
        assert!(err.has("item_data.sale_price", Rule::WrongType));
    }

    #[test]
    fn test_array_item_paths() {
        let criterion = FieldSchema::object(
            "",
            "",
            ObjectSchema::new(vec![
                FieldSchema::string("field", "Field"),
                FieldSchema::scalar("value", "Value"),
                FieldSchema::string("criteria", "Operator").default("="),
            ]),
        );
        let schema = ObjectSchema::new(vec![FieldSchema::array("criteria", "Criteria", criterion)]);

        let err = validate(
            &schema,
            Some(&json!({"criteria": [{"field": "name", "value": "x"}, {"value": [1]}]})),
        )
        .unwrap_err();
        assert!(err.has("criteria[1].field", Rule::Missing));
        assert!(err.has("criteria[1].value", Rule::WrongType));
        assert_eq!(err.violations.len(), 2);

        let params = validate(
            &schema,
            Some(&json!({"criteria": [{"field": "name", "value": "x"}]})),
        )
        .unwrap();
        assert_eq!(params.get("criteria").unwrap()[0]["criteria"], json!("="));
    }

    #[test]
    fn test_string_pattern_and_length() {
        let schema = ObjectSchema::new(vec![FieldSchema::string("ref", "Reference")
            .exact_len(5)
            .pattern(Pattern::Digits)]);

        let err = validate(&schema, Some(&json!({"ref": "12a"}))).unwrap_err();
        assert!(err.has("ref", Rule::Length));
        assert!(err.has("ref", Rule::Pattern));
    }

    #[test]
    fn test_parse_into_typed_params() {
        #[derive(serde::Deserialize)]
        struct ListParams {
            limit: u32,
            offset: u32,
        }

        let params = validate(&list_schema(), Some(&json!({"offset": 20}))).unwrap();
        let typed: ListParams = params.parse().unwrap();
        assert_eq!(typed.limit, 50);
        assert_eq!(typed.offset, 20);
    }
}
