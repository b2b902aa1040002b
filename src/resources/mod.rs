//! Managed resource types.
//!
//! Each resource owns its schema, its semantic validation and the mapping
//! between state values and Metal API objects. The provider looks them up
//! by type name in a [`ResourceRegistry`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::diff;
use crate::error::ProviderError;
use crate::metal::MetalClient;
use crate::schema::{Diagnostic, Schema};
use crate::types::PlanResult;
use crate::validation;

pub mod connection;
pub mod device;
pub mod project;
pub mod ssh_key;

pub use connection::ConnectionResource;
pub use device::DeviceResource;
pub use project::ProjectResource;
pub use ssh_key::SshKeyResource;

/// A managed resource type.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name, e.g. `equinix_metal_device`.
    fn type_name(&self) -> &'static str;

    /// Schema of the resource.
    fn schema(&self) -> Schema;

    /// Validate a resource configuration.
    ///
    /// The default checks structure only; resources add semantic rules.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Plan a change from `prior` (absent on create) to `config`.
    fn plan(&self, prior: Option<&Value>, config: &Value) -> Result<PlanResult, ProviderError> {
        Ok(diff::plan(&self.schema(), prior, config))
    }

    /// Create the remote object and return its state.
    async fn create(&self, client: &MetalClient, planned: &Value) -> Result<Value, ProviderError>;

    /// Refresh the state. `None` means the object no longer exists.
    async fn read(&self, client: &MetalClient, state: &Value)
        -> Result<Option<Value>, ProviderError>;

    /// Apply an in-place update and return the new state.
    async fn update(
        &self,
        client: &MetalClient,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object. Deleting an absent object succeeds.
    async fn delete(&self, client: &MetalClient, state: &Value) -> Result<(), ProviderError>;

    /// Build the state of an existing object from its id.
    async fn import(&self, client: &MetalClient, id: &str) -> Result<Value, ProviderError> {
        let seed = serde_json::json!({ "id": id });
        self.read(client, &seed).await?.ok_or_else(|| {
            ProviderError::NotFound(format!("{} {} does not exist", self.type_name(), id))
        })
    }

    /// Migrate state written by an older schema version.
    fn upgrade_state(&self, _version: u64, state: Value) -> Result<Value, ProviderError> {
        Ok(state)
    }
}

/// Resources keyed by type name.
pub type ResourceRegistry = BTreeMap<&'static str, Box<dyn Resource>>;

/// Every resource the provider serves.
pub fn registry() -> ResourceRegistry {
    let resources: Vec<Box<dyn Resource>> = vec![
        Box::new(ProjectResource),
        Box::new(SshKeyResource::user()),
        Box::new(SshKeyResource::project()),
        Box::new(DeviceResource::default()),
        Box::new(ConnectionResource),
    ];
    resources.into_iter().map(|r| (r.type_name(), r)).collect()
}

// ── State helpers ───────────────────────────────────────────────────

/// A non-empty string attribute.
pub(crate) fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// An owned non-empty string attribute.
pub(crate) fn get_string(value: &Value, key: &str) -> Option<String> {
    get_str(value, key).map(str::to_string)
}

/// A string attribute that must be present.
pub(crate) fn require_str<'a>(value: &'a Value, key: &str) -> Result<&'a str, ProviderError> {
    get_str(value, key)
        .ok_or_else(|| ProviderError::Validation(format!("\"{}\" must be set", key)))
}

/// A bool attribute, `false` when absent.
pub(crate) fn get_bool(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// A list of strings, empty when absent.
pub(crate) fn get_strings(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The `id` of a state value.
pub(crate) fn state_id(state: &Value) -> Result<&str, ProviderError> {
    get_str(state, "id").ok_or_else(|| ProviderError::Internal("state has no id".into()))
}

/// Whether `key` differs between two states.
pub(crate) fn changed(prior: &Value, planned: &Value, key: &str) -> bool {
    !diff::same_value(prior.get(key), planned.get(key))
}

/// Turn a not-found error into `None`.
pub(crate) fn found<T>(result: Result<T, ProviderError>) -> Result<Option<T>, ProviderError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Treat deleting an object that is already gone as success.
pub(crate) fn gone_ok(result: Result<(), ProviderError>) -> Result<(), ProviderError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

/// Copy `keys` from `from` into `into` when `into` lacks a value for them.
pub(crate) fn carry_over(into: &mut Value, from: &Value, keys: &[&str]) {
    let Value::Object(target) = into else {
        return;
    };
    for key in keys {
        let missing = target.get(*key).is_none_or(Value::is_null);
        if missing {
            if let Some(value) = from.get(*key).filter(|v| !v.is_null()) {
                target.insert((*key).to_string(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_contains_every_resource() {
        let names: Vec<_> = registry().keys().copied().collect();
        assert_eq!(
            names,
            vec![
                "equinix_metal_connection",
                "equinix_metal_device",
                "equinix_metal_project",
                "equinix_metal_project_ssh_key",
                "equinix_metal_ssh_key",
            ]
        );
    }

    #[test]
    fn state_helpers() {
        let state = json!({"id": "p1", "name": "", "tags": ["a", 1, "b"], "locked": true});

        assert_eq!(state_id(&state).unwrap(), "p1");
        assert_eq!(get_str(&state, "name"), None);
        assert!(require_str(&state, "name").is_err());
        assert_eq!(get_strings(&state, "tags"), vec!["a", "b"]);
        assert!(get_bool(&state, "locked"));
        assert!(!get_bool(&state, "always_pxe"));
        assert!(state_id(&json!({})).is_err());
    }

    #[test]
    fn not_found_handling() {
        let gone: Result<(), ProviderError> = Err(ProviderError::NotFound("x".into()));
        assert!(gone_ok(gone).is_ok());
        assert!(gone_ok(Err(ProviderError::Internal("x".into()))).is_err());

        let missing: Result<u8, ProviderError> = Err(ProviderError::NotFound("x".into()));
        assert_eq!(found(missing).unwrap(), None);
        assert_eq!(found(Ok(1u8)).unwrap(), Some(1));
    }

    #[test]
    fn carry_over_fills_missing_only() {
        let mut state = json!({"hostname": "h", "user_data": null});
        carry_over(
            &mut state,
            &json!({"hostname": "old", "user_data": "#!/bin/sh", "reinstall": null}),
            &["hostname", "user_data", "reinstall"],
        );
        assert_eq!(state, json!({"hostname": "h", "user_data": "#!/bin/sh"}));
    }

    #[test]
    fn changed_treats_unset_alike() {
        let prior = json!({"description": "", "tags": ["a"]});
        let planned = json!({"tags": ["a", "b"]});
        assert!(!changed(&prior, &planned, "description"));
        assert!(changed(&prior, &planned, "tags"));
    }
}
