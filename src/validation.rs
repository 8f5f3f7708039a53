//! Configuration validation helpers.
//!
//! [`validate`] checks a `serde_json::Value` against a [`Schema`]: required
//! attributes, attribute types and allowed string values. The remaining
//! helpers cover cross-attribute rules that a schema cannot express.
//!
//! # Example
//!
//! ```
//! use hcloud_network_provider::schema::{Attribute, Schema};
//! use hcloud_network_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("network_id", Attribute::required_int64())
//!     .with_attribute(
//!         "type",
//!         Attribute::required_string().with_allowed_values(["cloud", "server", "vswitch"]),
//!     );
//!
//! let diagnostics = validate(&schema, &json!({"network_id": 1, "type": "cloud"}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"network_id": "one", "type": "robot"}));
//! assert_eq!(diagnostics.len(), 2);
//! ```

use crate::network::subnet_id::parse_cidr;
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use serde_json::Value;
use std::collections::HashMap;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Strings must be one of the allowed values, if the schema lists any
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return diagnostics,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        }
    };

    let mut names: Vec<&String> = schema.block.attributes.keys().collect();
    names.sort();
    for name in names {
        let attr = &schema.block.attributes[name];
        validate_attribute(attr, obj.get(name), name, &mut diagnostics);
    }

    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
///
/// This is a convenience wrapper around [`validate`] that returns a Result.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
///
/// Returns `true` if valid, `false` otherwise.
/// Use [`validate`] to get detailed error information.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Require exactly one of `keys` to be set (present and non-null).
pub fn exactly_one_of(value: &Value, keys: &[&str]) -> Vec<Diagnostic> {
    let set: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| value.get(key).is_some_and(|v| !v.is_null()))
        .collect();

    if set.len() == 1 {
        return Vec::new();
    }

    let detail = if set.is_empty() {
        format!("None of {} is set", keys.join(", "))
    } else {
        format!("Only one may be set, got {}", set.join(", "))
    };
    vec![Diagnostic::error(format!("Exactly one of {} must be set", keys.join(", ")))
        .with_detail(detail)]
}

/// Require `key`, if set to a string, to be a CIDR block.
pub fn cidr(value: &Value, key: &str) -> Vec<Diagnostic> {
    match value.get(key).and_then(Value::as_str) {
        Some(s) if parse_cidr(s).is_none() => vec![Diagnostic::error(format!(
            "Invalid CIDR block for attribute '{}'",
            key
        ))
        .with_detail(format!("'{}' is not a CIDR block like 10.0.1.0/24", s))
        .with_attribute(key)],
        _ => Vec::new(),
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Skip computed-only attributes (provider sets these)
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            if diagnostics.len() == before {
                validate_allowed_value(attr, v, path, diagnostics);
            }
        }
    }
}

fn validate_allowed_value(
    attr: &Attribute,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.allowed_values.is_empty() {
        return;
    }
    if let Some(s) = value.as_str() {
        if !attr.allowed_values.iter().any(|allowed| allowed == s) {
            diagnostics.push(
                Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                    .with_detail(format!(
                        "Expected one of [{}], got '{}'",
                        attr.allowed_values.join(", "),
                        s
                    ))
                    .with_attribute(path),
            );
        }
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        }
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        }
        AttributeType::Float64 => {
            if !value.is_number() {
                diagnostics.push(type_error(path, "float64", value));
            }
        }
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        }
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        }
        AttributeType::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                validate_object_type(attrs, obj, path, diagnostics);
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        }
    }
}

fn validate_object_type(
    attrs: &HashMap<String, AttributeType>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        let attr_path = format!("{}.{}", path, name);
        if let Some(value) = obj.get(name) {
            validate_attribute_type(attr_type, value, &attr_path, diagnostics);
        }
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            if n.as_i64().is_some() {
                true
            } else if let Some(f) = n.as_f64() {
                // Integral floats such as 3.0 are accepted
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        }
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}
