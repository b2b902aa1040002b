//! Structural validation of configuration values against a [`Schema`].
//!
//! Checks required attributes, value types, nested block item counts and
//! `conflicts_with` pairs. Rules that depend on the meaning of values live
//! with the resource that owns them.
//!
//! # Example
//!
//! ```
//! use equinix_provider::schema::{Schema, Attribute};
//! use equinix_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("backend_transfer", Attribute::optional_bool());
//!
//! assert!(validate(&schema, &json!({"name": "infra"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "infra", "backend_transfer": "yes"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("backend_transfer"));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, NestedBlock, Schema,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Validate a JSON value against a schema.
///
/// An empty result means the value is valid.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Like [`validate`] but returns `Err` with the diagnostics when invalid.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Whether a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Whether a configuration value counts as set.
///
/// `null`, empty strings and empty collections are treated as unset.
pub fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

/// Check that a string attribute, when set, is one of `allowed`.
pub fn one_of(config: &Value, attribute: &str, allowed: &[&str]) -> Option<Diagnostic> {
    let value = config.get(attribute)?.as_str()?;
    if value.is_empty() || allowed.contains(&value) {
        return None;
    }
    Some(
        Diagnostic::error(format!(
            "expected {} to be one of {:?}, got {}",
            attribute, allowed, value
        ))
        .with_attribute(attribute),
    )
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let mut diag = Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", value_type_name(value)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
        if is_set(obj.get(name)) {
            validate_conflicts(block, name, attr, obj, path, diagnostics);
        }
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
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
        },
        Some(v) => validate_attribute_type(&attr.attr_type, v, path, diagnostics),
    }
}

fn validate_conflicts(
    block: &Block,
    name: &str,
    attr: &Attribute,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for other in &attr.conflicts_with {
        // Report each declared pair once, from the alphabetically first side.
        let reciprocal = block
            .attributes
            .get(other)
            .is_some_and(|a| a.conflicts_with.iter().any(|c| c == name));
        if is_set(obj.get(other)) && (!reciprocal || name < other.as_str()) {
            diagnostics.push(
                Diagnostic::error("Conflicting configuration arguments")
                    .with_detail(format!("\"{}\": conflicts with {}", name, other))
                    .with_attribute(join_path(path, name)),
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
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Float64 => {
            if !value.is_number() {
                diagnostics.push(type_error(path, "float64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) | AttributeType::Set(element_type) => {
            let Some(arr) = value.as_array() else {
                let expected = if matches!(attr_type, AttributeType::Set(_)) {
                    "set"
                } else {
                    "list"
                };
                diagnostics.push(type_error(path, expected, value));
                return;
            };
            for (i, elem) in arr.iter().enumerate() {
                let elem_path = format!("{}.{}", path, i);
                validate_attribute_type(element_type, elem, &elem_path, diagnostics);
            }
        },
        AttributeType::Map(value_type) => {
            let Some(obj) = value.as_object() else {
                diagnostics.push(type_error(path, "map", value));
                return;
            };
            for (key, val) in obj {
                let key_path = format!("{}.{}", path, key);
                validate_attribute_type(value_type, val, &key_path, diagnostics);
            }
        },
        AttributeType::Object(attrs) => {
            let Some(obj) = value.as_object() else {
                diagnostics.push(type_error(path, "object", value));
                return;
            };
            validate_object_type(attrs, obj, path, diagnostics);
        },
    }
}

fn validate_object_type(
    attrs: &BTreeMap<String, AttributeType>,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        if let Some(value) = obj.get(name).filter(|v| !v.is_null()) {
            validate_attribute_type(attr_type, value, &join_path(path, name), diagnostics);
        }
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let value = match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
            return;
        },
        Some(v) => v,
    };

    match (nested.nesting_mode, value) {
        (BlockNestingMode::Single, Value::Array(arr)) if arr.len() <= 1 => {
            // Hosts may encode a single block as a one-element list.
            if let Some(item) = arr.first() {
                validate_block(&nested.block, item, path, diagnostics);
            }
        },
        (BlockNestingMode::Single, v) => validate_block(&nested.block, v, path, diagnostics),
        (BlockNestingMode::List | BlockNestingMode::Set, Value::Array(arr)) => {
            check_item_count(nested, arr.len(), path, diagnostics);
            for (i, item) in arr.iter().enumerate() {
                validate_block(&nested.block, item, &format!("{}.{}", path, i), diagnostics);
            }
        },
        (BlockNestingMode::Map, Value::Object(obj)) => {
            check_item_count(nested, obj.len(), path, diagnostics);
            for (key, item) in obj {
                validate_block(&nested.block, item, &format!("{}.{}", path, key), diagnostics);
            }
        },
        (mode, v) => {
            let expected = if mode == BlockNestingMode::Map {
                "map"
            } else {
                "list"
            };
            diagnostics.push(
                Diagnostic::error(format!("Expected {} for block '{}'", expected, path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn check_item_count(
    nested: &NestedBlock,
    len: usize,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    if len < nested.min_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, len
            ))
            .with_attribute(path),
        );
    }
    if nested.max_items > 0 && len > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, len
            ))
            .with_attribute(path),
        );
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
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
        Value::Number(n) if n.is_i64() || n.is_u64() => n.as_i64().is_some(),
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64),
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("plan", Attribute::required_string());

        assert!(validate(&schema, &json!({"plan": "c3.small.x86"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("plan"));

        assert_eq!(validate(&schema, &json!({"plan": null})).len(), 1);

        let diagnostics = validate(&schema, &json!({"plan": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute(
            "speed",
            Attribute::new(AttributeType::Int64, AttributeFlags::required()),
        );

        assert!(validate(&schema, &json!({"speed": 42})).is_empty());
        assert!(validate(&schema, &json!({"speed": 42.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"speed": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"speed": "42"})).len(), 1);
        assert_eq!(validate(&schema, &json!({"speed": u64::MAX})).len(), 1);
    }

    #[test]
    fn test_validate_list_elements() {
        let schema = Schema::v0().with_attribute("tags", Attribute::optional_string_list());

        assert!(validate(&schema, &json!({"tags": ["a", "b"]})).is_empty());
        assert!(validate(&schema, &json!({"tags": []})).is_empty());

        let diagnostics = validate(&schema, &json!({"tags": ["a", 123]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("tags.1"));

        assert_eq!(validate(&schema, &json!({"tags": "a"})).len(), 1);
    }

    #[test]
    fn test_validate_conflicts_reported_once() {
        let schema = Schema::v0()
            .with_attribute(
                "metro",
                Attribute::optional_computed_string().with_conflict("facilities"),
            )
            .with_attribute(
                "facilities",
                Attribute::optional_string_list().with_conflict("metro"),
            );

        assert!(validate(&schema, &json!({"metro": "sv"})).is_empty());
        assert!(validate(&schema, &json!({"metro": "sv", "facilities": []})).is_empty());

        let diagnostics = validate(&schema, &json!({"metro": "sv", "facilities": ["sv15"]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Conflicting configuration arguments");
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("facilities"));
    }

    #[test]
    fn test_validate_single_block_accepts_list_encoding() {
        let schema = Schema::v0().with_block(
            "reinstall",
            NestedBlock::single(Block::new().with_attribute("enabled", Attribute::optional_bool())),
        );

        assert!(validate(&schema, &json!({"reinstall": {"enabled": true}})).is_empty());
        assert!(validate(&schema, &json!({"reinstall": [{"enabled": true}]})).is_empty());

        let diagnostics = validate(&schema, &json!({"reinstall": {"enabled": "yes"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("reinstall.enabled"));
    }

    #[test]
    fn test_validate_list_block_counts() {
        let schema = Schema::v0().with_block(
            "filter",
            NestedBlock::list(
                Block::new()
                    .with_attribute("attribute", Attribute::required_string())
                    .with_attribute(
                        "values",
                        Attribute::new(
                            AttributeType::list(AttributeType::String),
                            AttributeFlags::required(),
                        ),
                    ),
            )
            .with_min_items(1)
            .with_max_items(2),
        );

        let ok = json!({"filter": [{"attribute": "name", "values": ["c3.small.x86"]}]});
        assert!(validate(&schema, &ok).is_empty());

        let diagnostics = validate(&schema, &json!({"filter": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let f = json!({"attribute": "name", "values": []});
        let diagnostics = validate(&schema, &json!({"filter": [f, f, f]}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 2"));

        let diagnostics = validate(&schema, &json!({"filter": [{"values": ["x"]}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("filter.0.attribute"));
    }

    #[test]
    fn test_validate_object_type() {
        let schema = Schema::v0().with_attribute(
            "endpoint",
            Attribute::new(
                AttributeType::object([
                    ("host", AttributeType::String),
                    ("port", AttributeType::Int64),
                ]),
                AttributeFlags::required(),
            ),
        );

        assert!(validate(&schema, &json!({"endpoint": {"host": "h", "port": 1}})).is_empty());

        let diagnostics = validate(&schema, &json!({"endpoint": {"host": "h", "port": "1"}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("endpoint.port"));
    }

    #[test]
    fn test_one_of() {
        let config = json!({"billing_cycle": "weekly"});
        let diag = one_of(&config, "billing_cycle", &["hourly", "monthly"]).unwrap();
        assert!(diag.summary.contains("weekly"));

        assert!(one_of(&json!({"billing_cycle": "hourly"}), "billing_cycle", &["hourly"]).is_none());
        assert!(one_of(&json!({}), "billing_cycle", &["hourly"]).is_none());
    }

    #[test]
    fn test_is_set() {
        assert!(!is_set(None));
        assert!(!is_set(Some(&json!(null))));
        assert!(!is_set(Some(&json!(""))));
        assert!(!is_set(Some(&json!([]))));
        assert!(is_set(Some(&json!(false))));
        assert!(is_set(Some(&json!("sv"))));
    }

    #[test]
    fn test_helpers() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());
        assert!(is_valid(&schema, &json!({"name": "test"})));
        assert!(!is_valid(&schema, &json!({})));
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }
}
