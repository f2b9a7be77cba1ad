//! Product validator.
//!
//! Walks a candidate JSON value against one of the two compiled product
//! schemas and collects every violation in a single pass.
//!
//! Integer fields accept string literals holding an integer (`"4"`): the
//! value is coerced before range checks and the normalized document carries
//! the number. Numbers with a zero fractional part (`4.0`) count as integers.

use serde_json::{Map, Value as JsonValue};

use super::errors::{FieldError, ViolationKind};
use super::product::{create_schema, update_schema};
use super::types::{FieldType, ObjectSchema};

/// Which compiled schema to validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// All create-time required fields enforced.
    Create,
    /// Partial documents: no required fields, types and formats still checked.
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid(JsonValue),
    Invalid(Vec<FieldError>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }

    pub fn into_result(self) -> Result<JsonValue, Vec<FieldError>> {
        match self {
            ValidationResult::Valid(v) => Ok(v),
            ValidationResult::Invalid(errors) => Err(errors),
        }
    }
}

/// Both product schemas, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ProductValidator {
    create: ObjectSchema,
    update: ObjectSchema,
}

impl Default for ProductValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductValidator {
    pub fn new() -> Self {
        Self {
            create: create_schema(),
            update: update_schema(),
        }
    }

    pub fn schema(&self, variant: SchemaVariant) -> &ObjectSchema {
        match variant {
            SchemaVariant::Create => &self.create,
            SchemaVariant::Update => &self.update,
        }
    }

    pub fn validate(&self, variant: SchemaVariant, candidate: &JsonValue) -> ValidationResult {
        let mut errors = Vec::new();

        let normalized = match candidate {
            JsonValue::Object(obj) => {
                JsonValue::Object(check_object(self.schema(variant), obj, "", &mut errors))
            }
            other => {
                errors.push(FieldError::type_mismatch("$", "object", json_type_name(other)));
                other.clone()
            }
        };

        if errors.is_empty() {
            ValidationResult::Valid(normalized)
        } else {
            ValidationResult::Invalid(errors)
        }
    }
}

fn check_object(
    schema: &ObjectSchema,
    obj: &Map<String, JsonValue>,
    path_prefix: &str,
    errors: &mut Vec<FieldError>,
) -> Map<String, JsonValue> {
    // Undeclared fields pass through untouched.
    let mut out = obj.clone();

    for def in &schema.fields {
        let field_path = make_path(path_prefix, &def.name);
        match obj.get(&def.name) {
            None => {
                if def.required {
                    errors.push(FieldError::missing_required(field_path, &def.name));
                }
            }
            Some(JsonValue::Null) => errors.push(FieldError::null_not_allowed(field_path)),
            Some(value) => {
                let normalized = check_value(&def.field_type, value, &field_path, errors);
                out.insert(def.name.clone(), normalized);
            }
        }
    }

    out
}

fn check_value(
    field_type: &FieldType,
    value: &JsonValue,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> JsonValue {
    match field_type {
        FieldType::String { min_length, format } => {
            let Some(s) = value.as_str() else {
                errors.push(FieldError::type_mismatch(path, field_type.type_name(), json_type_name(value)));
                return value.clone();
            };
            if let Some(min) = min_length {
                if s.chars().count() < *min {
                    errors.push(FieldError::new(
                        path,
                        ViolationKind::MinLength,
                        format!("must NOT have fewer than {} characters", min),
                    ));
                }
            }
            if let Some(format) = format {
                if !format.matches(s) {
                    errors.push(FieldError::new(
                        path,
                        ViolationKind::BadFormat,
                        format!("must match format \"{}\"", format.name()),
                    ));
                }
            }
            value.clone()
        }
        FieldType::Integer { minimum, maximum } => {
            let Some(n) = coerce_integer(value) else {
                if is_integral_number(value) {
                    errors.push(FieldError::new(
                        path,
                        ViolationKind::OutOfRange,
                        "must fit in a signed 64-bit integer",
                    ));
                } else {
                    errors.push(FieldError::type_mismatch(path, field_type.type_name(), json_type_name(value)));
                }
                return value.clone();
            };
            if let Some(min) = minimum {
                if n < *min {
                    errors.push(FieldError::new(
                        path,
                        ViolationKind::OutOfRange,
                        format!("must be >= {}", min),
                    ));
                }
            }
            if let Some(max) = maximum {
                if n > *max {
                    errors.push(FieldError::new(
                        path,
                        ViolationKind::OutOfRange,
                        format!("must be <= {}", max),
                    ));
                }
            }
            JsonValue::from(n)
        }
        FieldType::Array(items) => {
            let Some(arr) = value.as_array() else {
                errors.push(FieldError::type_mismatch(path, field_type.type_name(), json_type_name(value)));
                return value.clone();
            };
            let normalized = arr
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let item_path = format!("{}[{}]", path, i);
                    if item.is_null() {
                        errors.push(FieldError::null_not_allowed(item_path));
                        return item.clone();
                    }
                    check_value(items, item, &item_path, errors)
                })
                .collect();
            JsonValue::Array(normalized)
        }
        FieldType::Object(schema) => match value.as_object() {
            Some(obj) => JsonValue::Object(check_object(schema, obj, path, errors)),
            None => {
                errors.push(FieldError::type_mismatch(path, field_type.type_name(), json_type_name(value)));
                value.clone()
            }
        },
    }
}

/// Integer view of a JSON value, coercing integer string literals.
fn coerce_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            if n.is_u64() {
                return None;
            }
            // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
            let f = n.as_f64()?;
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Some(f as i64)
            } else {
                None
            }
        }
        JsonValue::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

/// Whole JSON number, whatever its magnitude.
fn is_integral_number(value: &JsonValue) -> bool {
    match value {
        JsonValue::Number(n) => n.is_u64() || n.is_i64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
        _ => false,
    }
}

fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => "integer",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_product() -> JsonValue {
        json!({
            "title": "Pixel 8",
            "code": "PX-8",
            "description": "A phone",
            "reviewScore": 4,
            "price": 699,
            "imageUrl": "https://x.test/a.png",
            "tags": ["phone", "android"],
            "specifications": {
                "brand": "Google",
                "model": "Pixel 8",
                "camera": "50MP",
                "battery": "4575mAh",
                "storage": "128GB",
                "colour": "Obsidian",
                "modelYear": "2023-10-04"
            }
        })
    }

    fn kinds_at<'a>(errors: &'a [FieldError], path: &str) -> Vec<ViolationKind> {
        errors.iter().filter(|e| e.path == path).map(|e| e.kind).collect()
    }

    #[test]
    fn test_valid_product_passes_create() {
        let validator = ProductValidator::new();
        let result = validator.validate(SchemaVariant::Create, &valid_product());
        assert!(result.is_valid(), "{:?}", result.errors());
    }

    #[test]
    fn test_each_missing_required_field_reported() {
        let validator = ProductValidator::new();
        let mut product = valid_product();
        let obj = product.as_object_mut().unwrap();
        obj.remove("title");
        obj.remove("code");

        let errors = validator
            .validate(SchemaVariant::Create, &product)
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ViolationKind::MissingRequired));
        assert_eq!(kinds_at(&errors, "title"), vec![ViolationKind::MissingRequired]);
        assert_eq!(kinds_at(&errors, "code"), vec![ViolationKind::MissingRequired]);
    }

    #[test]
    fn test_all_required_fields_missing() {
        let validator = ProductValidator::new();
        let errors = validator
            .validate(SchemaVariant::Create, &json!({}))
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_specifications_missing_model_year() {
        let validator = ProductValidator::new();
        let mut product = valid_product();
        product["specifications"]
            .as_object_mut()
            .unwrap()
            .remove("modelYear");

        let errors = validator
            .validate(SchemaVariant::Create, &product)
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "specifications.modelYear");
        assert_eq!(errors[0].kind, ViolationKind::MissingRequired);
    }

    #[test]
    fn test_update_accepts_empty_object() {
        let validator = ProductValidator::new();
        assert!(validator.validate(SchemaVariant::Update, &json!({})).is_valid());
    }

    #[test]
    fn test_update_accepts_partial_specifications() {
        let validator = ProductValidator::new();
        let result = validator.validate(
            SchemaVariant::Update,
            &json!({ "specifications": { "colour": "Red" } }),
        );
        assert!(result.is_valid());
    }

    #[test]
    fn test_update_review_score_out_of_range() {
        let validator = ProductValidator::new();
        let errors = validator
            .validate(SchemaVariant::Update, &json!({ "reviewScore": 9 }))
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "reviewScore");
        assert_eq!(errors[0].kind, ViolationKind::OutOfRange);
    }

    #[test]
    fn test_image_url_format() {
        let validator = ProductValidator::new();
        let errors = validator
            .validate(SchemaVariant::Update, &json!({ "imageUrl": "not-a-url" }))
            .into_result()
            .unwrap_err();
        assert_eq!(kinds_at(&errors, "imageUrl"), vec![ViolationKind::BadFormat]);

        let ok = validator.validate(
            SchemaVariant::Update,
            &json!({ "imageUrl": "https://x.test/a.png" }),
        );
        assert!(ok.is_valid());
    }

    #[test]
    fn test_null_rejected_for_declared_fields() {
        let validator = ProductValidator::new();
        let errors = validator
            .validate(
                SchemaVariant::Update,
                &json!({ "price": null, "specifications": { "brand": null } }),
            )
            .into_result()
            .unwrap_err();
        assert_eq!(kinds_at(&errors, "price"), vec![ViolationKind::NullNotAllowed]);
        assert_eq!(
            kinds_at(&errors, "specifications.brand"),
            vec![ViolationKind::NullNotAllowed]
        );
    }

    #[test]
    fn test_null_allowed_for_undeclared_fields() {
        let validator = ProductValidator::new();
        let mut product = valid_product();
        product["warehouse"] = JsonValue::Null;
        match validator.validate(SchemaVariant::Create, &product) {
            ValidationResult::Valid(normalized) => assert!(normalized["warehouse"].is_null()),
            ValidationResult::Invalid(errors) => panic!("unexpected errors {:?}", errors),
        }
    }

    #[test]
    fn test_integer_string_is_coerced() {
        let validator = ProductValidator::new();
        let result = validator.validate(
            SchemaVariant::Update,
            &json!({ "reviewScore": "3", "price": "1999" }),
        );
        match result {
            ValidationResult::Valid(normalized) => {
                assert_eq!(normalized["reviewScore"], json!(3));
                assert_eq!(normalized["price"], json!(1999));
            }
            ValidationResult::Invalid(errors) => panic!("unexpected errors {:?}", errors),
        }

        let errors = validator
            .validate(SchemaVariant::Update, &json!({ "reviewScore": "7" }))
            .into_result()
            .unwrap_err();
        assert_eq!(errors[0].kind, ViolationKind::OutOfRange);
    }

    #[test]
    fn test_non_integer_values_rejected() {
        let validator = ProductValidator::new();
        let errors = validator
            .validate(
                SchemaVariant::Update,
                &json!({ "price": 9.5, "reviewScore": "four" }),
            )
            .into_result()
            .unwrap_err();
        assert_eq!(kinds_at(&errors, "price"), vec![ViolationKind::TypeMismatch]);
        assert_eq!(kinds_at(&errors, "reviewScore"), vec![ViolationKind::TypeMismatch]);

        assert!(validator
            .validate(SchemaVariant::Update, &json!({ "price": 10.0 }))
            .is_valid());
    }

    #[test]
    fn test_integers_beyond_i64_are_out_of_range() {
        let validator = ProductValidator::new();

        let max: JsonValue = serde_json::from_str("9223372036854775807").unwrap();
        match validator.validate(SchemaVariant::Update, &json!({ "price": max })) {
            ValidationResult::Valid(normalized) => assert_eq!(normalized["price"], json!(i64::MAX)),
            ValidationResult::Invalid(errors) => panic!("unexpected errors {:?}", errors),
        }

        for literal in ["9223372036854775808", "9223372036854776000", "18446744073709551615", "9.3e18"] {
            let big: JsonValue = serde_json::from_str(literal).unwrap();
            let errors = validator
                .validate(SchemaVariant::Update, &json!({ "price": big }))
                .into_result()
                .unwrap_err();
            assert_eq!(kinds_at(&errors, "price"), vec![ViolationKind::OutOfRange], "{}", literal);
            assert!(!errors[0].message.contains("got integer"));
        }
    }

    #[test]
    fn test_tags_items_checked_with_bracket_paths() {
        let validator = ProductValidator::new();
        let errors = validator
            .validate(SchemaVariant::Update, &json!({ "tags": ["ok", "", 3] }))
            .into_result()
            .unwrap_err();
        assert_eq!(kinds_at(&errors, "tags[1]"), vec![ViolationKind::MinLength]);
        assert_eq!(kinds_at(&errors, "tags[2]"), vec![ViolationKind::TypeMismatch]);
        assert!(kinds_at(&errors, "tags[0]").is_empty());
    }

    #[test]
    fn test_collects_all_violations_in_one_pass() {
        let validator = ProductValidator::new();
        let errors = validator
            .validate(
                SchemaVariant::Create,
                &json!({
                    "title": "",
                    "code": 12,
                    "description": "d",
                    "reviewScore": 0,
                    "imageUrl": "nope",
                    "tags": "phone",
                    "specifications": { "modelYear": "yesterday" }
                }),
            )
            .into_result()
            .unwrap_err();

        assert_eq!(kinds_at(&errors, "title"), vec![ViolationKind::MinLength]);
        assert_eq!(kinds_at(&errors, "code"), vec![ViolationKind::TypeMismatch]);
        assert_eq!(kinds_at(&errors, "reviewScore"), vec![ViolationKind::OutOfRange]);
        assert_eq!(kinds_at(&errors, "imageUrl"), vec![ViolationKind::BadFormat]);
        assert_eq!(kinds_at(&errors, "tags"), vec![ViolationKind::TypeMismatch]);
        assert_eq!(
            kinds_at(&errors, "specifications.modelYear"),
            vec![ViolationKind::BadFormat]
        );
        // six specification fields besides modelYear are missing
        let missing_specs = errors
            .iter()
            .filter(|e| {
                e.path.starts_with("specifications.") && e.kind == ViolationKind::MissingRequired
            })
            .count();
        assert_eq!(missing_specs, 6);
    }

    #[test]
    fn test_non_object_candidate() {
        let validator = ProductValidator::new();
        let errors = validator
            .validate(SchemaVariant::Update, &json!(["not", "an", "object"]))
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "$");
        assert_eq!(errors[0].kind, ViolationKind::TypeMismatch);
    }
}
