//! Plan computation.
//!
//! Compares the configuration of a resource against its prior state using
//! the resource schema and produces the planned state, the attribute level
//! changes and whether the object has to be replaced.
//!
//! Rules, per top-level attribute:
//!
//! - computed-only attributes keep their prior value; on create they are
//!   unknown and left out of the planned state
//! - configured values win
//! - an omitted attribute takes its schema default, or its prior value when
//!   it is optional and computed
//! - unset values (`null`, `""`, `[]`, `{}`) compare equal to each other
//!
//! Nested blocks are planned as whole values.

use crate::schema::{Attribute, BlockNestingMode, NestedBlock, Schema};
use crate::types::{AttributeChange, PlanResult};
use crate::validation::is_set;
use serde_json::{Map, Value};

/// Compute the plan for a resource.
///
/// `prior` is `None` when the object is being created.
pub fn plan(schema: &Schema, prior: Option<&Value>, config: &Value) -> PlanResult {
    let mut planned = Map::new();

    for (name, attr) in &schema.block.attributes {
        if let Some(value) = planned_attribute(attr, prior.and_then(|p| p.get(name)), config.get(name))
        {
            planned.insert(name.clone(), value);
        }
    }

    for (name, nested) in &schema.block.blocks {
        if let Some(value) = planned_block(nested, config.get(name)) {
            planned.insert(name.clone(), value);
        }
    }

    let planned = Value::Object(planned);
    let Some(prior) = prior.filter(|p| p.is_object()) else {
        return create_plan(schema, planned);
    };

    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.block.attributes {
        if attr.flags.is_computed_only() {
            continue;
        }
        if let Some(change) = attribute_change(name, prior.get(name), planned.get(name)) {
            requires_replace |= attr.force_new;
            changes.push(change);
        }
    }

    for (name, nested) in &schema.block.blocks {
        if let Some(change) = attribute_change(name, prior.get(name), planned.get(name)) {
            requires_replace |= nested.force_new;
            changes.push(change);
        }
    }

    if changes.is_empty() {
        return PlanResult::no_change(planned);
    }

    let mut result = PlanResult::with_changes(planned, changes, false);
    if requires_replace {
        require_replacement(schema, &mut result);
    }
    result
}

/// Turn an update plan into a replacement.
///
/// Computed-only attributes become unknown again because the new object
/// gets fresh values for them.
pub fn require_replacement(schema: &Schema, result: &mut PlanResult) {
    result.requires_replace = true;
    if let Value::Object(planned) = &mut result.planned_state {
        for (name, attr) in &schema.block.attributes {
            if attr.flags.is_computed_only() {
                planned.remove(name);
            }
        }
    }
}

/// Whether two attribute values are the same for planning purposes.
pub fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (is_set(a), is_set(b)) {
        (false, false) => true,
        (true, true) => a == b,
        _ => false,
    }
}

fn create_plan(schema: &Schema, planned: Value) -> PlanResult {
    let changes = planned
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(name, value)| {
                    !value.is_null()
                        && schema
                            .attribute(name)
                            .is_none_or(|attr| !attr.flags.is_computed_only())
                })
                .map(|(name, value)| AttributeChange::added(name.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    PlanResult::with_changes(planned, changes, false)
}

fn planned_attribute(
    attr: &Attribute,
    prior: Option<&Value>,
    config: Option<&Value>,
) -> Option<Value> {
    let prior = prior.filter(|v| !v.is_null()).cloned();

    if attr.flags.is_computed_only() {
        return prior;
    }
    if let Some(value) = config.filter(|v| !v.is_null()) {
        return Some(value.clone());
    }
    if let Some(default) = &attr.default {
        return Some(default.clone());
    }
    if attr.flags.computed {
        return prior;
    }
    None
}

fn planned_block(nested: &NestedBlock, config: Option<&Value>) -> Option<Value> {
    match (nested.nesting_mode, config?) {
        (_, Value::Null) => None,
        (BlockNestingMode::Single, Value::Array(items)) => items.first().cloned(),
        (_, value) => Some(value.clone()),
    }
}

fn attribute_change(
    name: &str,
    prior: Option<&Value>,
    planned: Option<&Value>,
) -> Option<AttributeChange> {
    if same_value(prior, planned) {
        return None;
    }
    let prior = prior.filter(|_| is_set(prior)).cloned();
    let planned = planned.filter(|_| is_set(planned)).cloned();
    Some(AttributeChange::new(name, prior, planned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Block;
    use serde_json::json;

    fn device_like_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("state", Attribute::computed_string())
            .with_attribute("hostname", Attribute::optional_computed_string())
            .with_attribute("plan", Attribute::required_string().with_force_new())
            .with_attribute("tags", Attribute::optional_string_list())
            .with_attribute(
                "billing_cycle",
                Attribute::optional_string().with_default(json!("hourly")),
            )
            .with_block(
                "reinstall",
                NestedBlock::single(Block::new().with_attribute("enabled", Attribute::optional_bool())),
            )
    }

    fn prior() -> Value {
        json!({
            "id": "d1",
            "state": "active",
            "hostname": "tfacc-device",
            "plan": "c3.small.x86",
            "tags": [],
            "billing_cycle": "hourly",
        })
    }

    #[test]
    fn create_leaves_computed_unknown_and_applies_defaults() {
        let result = plan(
            &device_like_schema(),
            None,
            &json!({"plan": "c3.small.x86", "tags": ["a"]}),
        );

        assert!(!result.requires_replace);
        assert!(result.planned_state.get("id").is_none());
        assert_eq!(result.planned_state["billing_cycle"], "hourly");
        assert!(result.change("plan").is_some());
        assert!(result.change("billing_cycle").is_some());
        assert!(result.change("id").is_none());
        assert!(result.change("hostname").is_none());
    }

    #[test]
    fn unchanged_config_plans_no_change() {
        let result = plan(&device_like_schema(), Some(&prior()), &json!({"plan": "c3.small.x86"}));

        assert!(!result.has_changes());
        assert_eq!(result.planned_state["id"], "d1");
        assert_eq!(result.planned_state["hostname"], "tfacc-device");
    }

    #[test]
    fn in_place_update_keeps_computed_values() {
        let result = plan(
            &device_like_schema(),
            Some(&prior()),
            &json!({"plan": "c3.small.x86", "hostname": "renamed", "tags": ["x"]}),
        );

        assert!(!result.requires_replace);
        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.planned_state["id"], "d1");
        let change = result.change("hostname").unwrap();
        assert_eq!(change.before, Some(json!("tfacc-device")));
        assert_eq!(change.after, Some(json!("renamed")));
    }

    #[test]
    fn force_new_change_requires_replace() {
        let result = plan(
            &device_like_schema(),
            Some(&prior()),
            &json!({"plan": "m3.small.x86"}),
        );

        assert!(result.requires_replace);
        assert!(result.planned_state.get("id").is_none());
        assert!(result.planned_state.get("state").is_none());
    }

    #[test]
    fn single_block_list_encoding_is_unwrapped() {
        let result = plan(
            &device_like_schema(),
            Some(&prior()),
            &json!({"plan": "c3.small.x86", "reinstall": [{"enabled": true}]}),
        );

        assert_eq!(result.planned_state["reinstall"], json!({"enabled": true}));
        assert!(result.change("reinstall").is_some());
        assert!(!result.requires_replace);
    }

    #[test]
    fn unset_values_compare_equal() {
        assert!(same_value(None, Some(&json!(null))));
        assert!(same_value(Some(&json!("")), None));
        assert!(same_value(Some(&json!([])), Some(&json!(null))));
        assert!(!same_value(Some(&json!(false)), None));
        assert!(!same_value(Some(&json!(["a"])), Some(&json!(["b"]))));
    }
}
