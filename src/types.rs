//! Plain Rust counterparts of the protocol messages resources work with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Dotted path of the attribute.
    pub path: String,
    /// Value before the change, `None` when the attribute is being set.
    pub before: Option<Value>,
    /// Value after the change, `None` when the attribute is being cleared
    /// or is not known until apply.
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// An attribute that gets a value.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// An attribute that loses its value.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// An attribute whose value changes.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

impl From<crate::generated::AttributeChange> for AttributeChange {
    fn from(proto: crate::generated::AttributeChange) -> Self {
        Self {
            path: proto.path,
            before: decode_value(&proto.before).ok().flatten(),
            after: decode_value(&proto.after).ok().flatten(),
        }
    }
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        Self {
            path: change.path,
            before: encode_value(change.before.as_ref()),
            after: encode_value(change.after.as_ref()),
        }
    }
}

/// The result of planning a resource change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// State expected after apply. Values unknown until apply are `null`.
    pub planned_state: Value,
    /// Attribute level changes against the prior state.
    pub changes: Vec<AttributeChange>,
    /// Whether the object has to be destroyed and created again.
    pub requires_replace: bool,
}

impl PlanResult {
    /// A plan that leaves the object untouched.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// A plan with the given changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Whether the plan changes anything.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// The change for `path`, if any.
    pub fn change(&self, path: &str) -> Option<&AttributeChange> {
        self.changes.iter().find(|c| c.path == path)
    }
}

/// An object brought under management by import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type, e.g. `equinix_metal_device`.
    pub resource_type: String,
    /// The state read from the API.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

impl TryFrom<ImportedResource> for crate::generated::ImportedResource {
    type Error = serde_json::Error;

    fn try_from(imported: ImportedResource) -> Result<Self, Self::Error> {
        Ok(Self {
            resource_type: imported.resource_type,
            state: serde_json::to_vec(&imported.state)?,
        })
    }
}

/// Metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
}

/// Server capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerCapabilities {
    /// Whether the provider plans destroy operations.
    pub plan_destroy: bool,
}

/// Protocol version announced in the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// First field of the handshake line.
pub const HANDSHAKE_PREFIX: &str = "HEMMER_PROVIDER";

/// Encode an optional JSON value as protocol bytes; absent is empty.
pub(crate) fn encode_value(value: Option<&Value>) -> Vec<u8> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(v) => serde_json::to_vec(v).unwrap_or_default(),
    }
}

/// Decode protocol bytes; empty input and a JSON `null` are both absent.
pub(crate) fn decode_value(bytes: &[u8]) -> Result<Option<Value>, serde_json::Error> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(bytes)?;
    Ok((!value.is_null()).then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("hostname", json!("tf-device"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("tf-device")));

        let removed = AttributeChange::removed("description", json!("old"));
        assert_eq!(removed.before, Some(json!("old")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("tags", json!(["a"]), json!(["a", "b"]));
        assert_eq!(modified.before, Some(json!(["a"])));
    }

    #[test]
    fn test_attribute_change_conversion() {
        let change = AttributeChange::modified("plan", json!("c3.small.x86"), json!("m3.small.x86"));

        let proto: crate::generated::AttributeChange = change.clone().into();
        assert_eq!(proto.path, "plan");
        assert_eq!(proto.before, br#""c3.small.x86""#.to_vec());

        let back: AttributeChange = proto.into();
        assert_eq!(back, change);

        let unknown: crate::generated::AttributeChange =
            AttributeChange::added("id", Value::Null).into();
        assert!(unknown.after.is_empty());
    }

    #[test]
    fn test_plan_result_lookup() {
        let plan = PlanResult::with_changes(
            json!({"id": "d1", "hostname": "new"}),
            vec![AttributeChange::modified("hostname", json!("old"), json!("new"))],
            false,
        );
        assert!(plan.has_changes());
        assert!(plan.change("hostname").is_some());
        assert!(plan.change("plan").is_none());

        assert!(!PlanResult::no_change(json!({})).has_changes());
    }

    #[test]
    fn test_imported_resource_to_proto() {
        let imported = ImportedResource::new("equinix_metal_ssh_key", json!({"id": "k1"}));
        let proto = crate::generated::ImportedResource::try_from(imported).unwrap();
        assert_eq!(proto.resource_type, "equinix_metal_ssh_key");
        assert_eq!(proto.state, br#"{"id":"k1"}"#.to_vec());
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(decode_value(b"").unwrap(), None);
        assert_eq!(decode_value(b"null").unwrap(), None);
        assert_eq!(decode_value(br#"{"a":1}"#).unwrap(), Some(json!({"a": 1})));
        assert!(decode_value(b"{").is_err());
        assert!(encode_value(Some(&Value::Null)).is_empty());
    }
}
