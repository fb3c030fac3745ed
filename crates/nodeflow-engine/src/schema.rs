//! Input/output contracts for nodes
//!
//! A [`Schema`] describes the shape of a value a node accepts or produces.
//! [`validate`] checks a value against a schema and returns a normalized copy
//! with record defaults applied and unknown record keys dropped. The input
//! value is never modified, so a failed validation leaves no partial defaults
//! behind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Path of the root value in [`SchemaError::field`]
pub const ROOT_PATH: &str = "$";

/// Shape of a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    /// Only the absence value (`null`)
    Void,
    /// Any value, passed through unchanged
    Any,
    /// Text string
    String,
    /// Numeric value
    Number,
    /// Boolean value
    Boolean,
    /// Homogeneous list
    Array { items: Box<Schema> },
    /// Object with named fields
    Record { fields: Vec<FieldSchema> },
}

/// A named field of a record schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Field name (object key)
    pub name: String,
    /// Shape of the field value
    pub schema: Schema,
    /// Whether the field must be present
    pub required: bool,
    /// Value used when the field is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSchema {
    /// Create a required field
    pub fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            required: true,
            default: None,
            description: None,
        }
    }

    /// Create an optional field
    pub fn optional(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            required: false,
            default: None,
            description: None,
        }
    }

    /// Set a default value applied when the field is absent
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Set a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Schema {
    /// Create a record schema from its fields
    pub fn record(fields: impl IntoIterator<Item = FieldSchema>) -> Self {
        Self::Record {
            fields: fields.into_iter().collect(),
        }
    }

    /// Create an array schema
    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Box::new(items),
        }
    }

    /// Short name of the shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array { .. } => "array",
            Self::Record { .. } => "record",
        }
    }

    /// Whether the absence value satisfies this schema
    pub fn accepts_absence(&self) -> bool {
        validate(self, &Value::Null).is_ok()
    }

    /// Look up a record field by name
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        match self {
            Self::Record { fields } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }
}

/// A value did not match a schema
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("field '{field}': expected {expected}, received {received}")]
pub struct SchemaError {
    /// Dotted path of the offending field (`$` is the root)
    pub field: String,
    /// Expected shape
    pub expected: String,
    /// Shape actually received
    pub received: String,
}

impl SchemaError {
    fn mismatch(field: &str, schema: &Schema, value: &Value) -> Self {
        Self {
            field: field.to_string(),
            expected: schema.type_name().to_string(),
            received: describe(value).to_string(),
        }
    }

    fn missing(field: &str, schema: &Schema) -> Self {
        Self {
            field: field.to_string(),
            expected: schema.type_name().to_string(),
            received: "absent".to_string(),
        }
    }
}

/// Validate a value against a schema
///
/// Returns the normalized value: record defaults are filled in and keys not
/// declared by a record schema are dropped. Validating a returned value again
/// yields the same value.
pub fn validate(schema: &Schema, value: &Value) -> Result<Value, SchemaError> {
    validate_at(schema, value, ROOT_PATH)
}

fn validate_at(schema: &Schema, value: &Value, path: &str) -> Result<Value, SchemaError> {
    match (schema, value) {
        (Schema::Any, _) => Ok(value.clone()),
        (Schema::Void, Value::Null)
        | (Schema::String, Value::String(_))
        | (Schema::Number, Value::Number(_))
        | (Schema::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (Schema::Array { items }, Value::Array(values)) => values
            .iter()
            .enumerate()
            .map(|(i, v)| validate_at(items, v, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (Schema::Record { fields }, Value::Object(map)) => validate_record(fields, map, path),
        _ => Err(SchemaError::mismatch(path, schema, value)),
    }
}

fn validate_record(
    fields: &[FieldSchema],
    map: &Map<String, Value>,
    path: &str,
) -> Result<Value, SchemaError> {
    let mut validated = Map::new();

    for field in fields {
        let field_path = format!("{}.{}", path, field.name);
        let candidate = map.get(&field.name).or(field.default.as_ref());

        match candidate {
            Some(v) => {
                let v = validate_at(&field.schema, v, &field_path)?;
                validated.insert(field.name.clone(), v);
            }
            None if field.required => {
                return Err(SchemaError::missing(&field_path, &field.schema));
            }
            None => {}
        }
    }

    Ok(Value::Object(validated))
}

/// Short name of a value's shape
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "void",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "record",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn completion_input() -> Schema {
        Schema::record([
            FieldSchema::required("prompt", Schema::String),
            FieldSchema::optional("temperature", Schema::Number).with_default(json!(0.7)),
            FieldSchema::optional("systemPrompt", Schema::String)
                .with_default(json!("You are a helpful assistant.")),
        ])
    }

    #[test]
    fn test_primitives() {
        assert_eq!(validate(&Schema::String, &json!("hi")).unwrap(), json!("hi"));
        assert_eq!(validate(&Schema::Number, &json!(1.5)).unwrap(), json!(1.5));
        assert_eq!(validate(&Schema::Boolean, &json!(true)).unwrap(), json!(true));
        assert_eq!(validate(&Schema::Void, &Value::Null).unwrap(), Value::Null);
        assert_eq!(validate(&Schema::Any, &json!([1, "x"])).unwrap(), json!([1, "x"]));

        let err = validate(&Schema::String, &json!(123)).unwrap_err();
        assert_eq!(err.field, "$");
        assert_eq!(err.expected, "string");
        assert_eq!(err.received, "number");
    }

    #[test]
    fn test_void_rejects_values() {
        let err = validate(&Schema::Void, &json!("x")).unwrap_err();
        assert_eq!(err.expected, "void");
        assert!(Schema::Void.accepts_absence());
        assert!(!Schema::String.accepts_absence());
    }

    #[test]
    fn test_defaults_applied() {
        let validated = validate(&completion_input(), &json!({"prompt": "test prompt"})).unwrap();
        assert_eq!(validated["temperature"], json!(0.7));
        assert_eq!(validated["systemPrompt"], json!("You are a helpful assistant."));
    }

    #[test]
    fn test_explicit_values_win_over_defaults() {
        let validated = validate(
            &completion_input(),
            &json!({"prompt": "p", "temperature": 0.2}),
        )
        .unwrap();
        assert_eq!(validated["temperature"], json!(0.2));
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate(&completion_input(), &json!({"temperature": 0.5})).unwrap_err();
        assert_eq!(err.field, "$.prompt");
        assert_eq!(err.received, "absent");
    }

    #[test]
    fn test_wrong_field_type_reports_path() {
        let err = validate(&completion_input(), &json!({"prompt": 123})).unwrap_err();
        assert_eq!(err.field, "$.prompt");
        assert_eq!(err.expected, "string");
    }

    #[test]
    fn test_failure_leaves_input_untouched() {
        let input = json!({"temperature": "hot"});
        let before = input.clone();
        assert!(validate(&completion_input(), &input).is_err());
        assert_eq!(input, before);
    }

    #[test]
    fn test_invalid_default_is_rejected() {
        let schema = Schema::record([
            FieldSchema::optional("count", Schema::Number).with_default(json!("three"))
        ]);
        let err = validate(&schema, &json!({})).unwrap_err();
        assert_eq!(err.field, "$.count");
    }

    #[test]
    fn test_unknown_keys_dropped() {
        let schema = Schema::record([FieldSchema::required("text", Schema::String)]);
        let validated = validate(&schema, &json!({"text": "a", "extra": 1})).unwrap();
        assert_eq!(validated, json!({"text": "a"}));
    }

    #[test]
    fn test_optional_without_default_stays_absent() {
        let schema = Schema::record([FieldSchema::optional("note", Schema::String)]);
        assert_eq!(validate(&schema, &json!({})).unwrap(), json!({}));
    }

    #[test]
    fn test_nested_array_path() {
        let schema = Schema::record([FieldSchema::required(
            "items",
            Schema::array(Schema::Number),
        )]);
        let err = validate(&schema, &json!({"items": [1, 2, "x"]})).unwrap_err();
        assert_eq!(err.field, "$.items[2]");
    }

    #[test]
    fn test_record_rejects_absence() {
        assert!(!completion_input().accepts_absence());
        let err = validate(&completion_input(), &Value::Null).unwrap_err();
        assert_eq!(err.received, "void");
    }

    #[test]
    fn test_schema_serde_roundtrip() {
        let schema = completion_input();
        let json = serde_json::to_string(&schema).unwrap();
        let restored: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, schema);
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map(
                    prop_oneof![
                        Just("prompt".to_string()),
                        Just("temperature".to_string()),
                        Just("systemPrompt".to_string()),
                        "[a-z]{1,6}",
                    ],
                    inner,
                    0..4,
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_defaulting_is_idempotent(prompt in "[ -~]{0,32}", temp in prop::option::of(0.0f64..1.0)) {
            let mut input = json!({"prompt": prompt});
            if let Some(t) = temp {
                input["temperature"] = json!(t);
            }
            let once = validate(&completion_input(), &input).unwrap();
            let twice = validate(&completion_input(), &once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_validated_values_revalidate_unchanged(value in arb_json()) {
            let schema = completion_input();
            if let Ok(once) = validate(&schema, &value) {
                let twice = validate(&schema, &once).unwrap();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
