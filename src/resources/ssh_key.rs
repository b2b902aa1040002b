//! `equinix_metal_ssh_key` and `equinix_metal_project_ssh_key`
//!
//! Both types share one API object; project keys are created under a
//! project and carry its id.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{found, get_str, gone_ok, require_str, state_id, Resource};
use crate::error::ProviderError;
use crate::metal::models::{SshKey, SshKeyCreateRequest, SshKeyUpdateRequest};
use crate::metal::MetalClient;
use crate::schema::{Attribute, Schema};

/// An SSH key owned by the user or by a project.
#[derive(Debug, Clone, Copy)]
pub struct SshKeyResource {
    project_scoped: bool,
}

impl SshKeyResource {
    /// A key owned by the authenticated user.
    pub fn user() -> Self {
        Self {
            project_scoped: false,
        }
    }

    /// A key owned by a project.
    pub fn project() -> Self {
        Self {
            project_scoped: true,
        }
    }

    fn key_state(&self, key: &SshKey, project_id: Option<&str>) -> Value {
        let owner_id = key.owner.as_ref().and_then(|o| o.id());
        let mut state = json!({
            "id": key.id,
            "name": key.label,
            "public_key": key.key,
            "fingerprint": key.fingerprint,
            "owner_id": owner_id,
            "created": key.created_at,
            "updated": key.updated_at,
        });
        if self.project_scoped {
            let project_id = project_id.map(str::to_string).or(owner_id);
            state["project_id"] = json!(project_id);
        }
        state
    }
}

#[async_trait]
impl Resource for SshKeyResource {
    fn type_name(&self) -> &'static str {
        if self.project_scoped {
            "equinix_metal_project_ssh_key"
        } else {
            "equinix_metal_ssh_key"
        }
    }

    fn schema(&self) -> Schema {
        let schema = Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Label of the key"),
            )
            .with_attribute(
                "public_key",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Public key in OpenSSH format"),
            )
            .with_attribute("fingerprint", Attribute::computed_string())
            .with_attribute("owner_id", Attribute::computed_string())
            .with_attribute("created", Attribute::computed_string())
            .with_attribute("updated", Attribute::computed_string());

        if self.project_scoped {
            schema
                .with_description("An SSH key scoped to a project.")
                .with_attribute(
                    "project_id",
                    Attribute::required_string().with_force_new(),
                )
        } else {
            schema.with_description("An SSH key of the authenticated user.")
        }
    }

    async fn create(&self, client: &MetalClient, planned: &Value) -> Result<Value, ProviderError> {
        let req = SshKeyCreateRequest {
            label: require_str(planned, "name")?.to_string(),
            key: require_str(planned, "public_key")?.trim().to_string(),
        };

        let (key, project_id) = if self.project_scoped {
            let project_id = require_str(planned, "project_id")?;
            let key = client.create_project_ssh_key(project_id, &req).await?;
            (key, Some(project_id))
        } else {
            (client.create_ssh_key(&req).await?, None)
        };
        info!(ssh_key = %key.id, fingerprint = %key.fingerprint, "created ssh key");

        Ok(self.key_state(&key, project_id))
    }

    async fn read(
        &self,
        client: &MetalClient,
        state: &Value,
    ) -> Result<Option<Value>, ProviderError> {
        let id = state_id(state)?;
        let project_id = get_str(state, "project_id");
        Ok(found(client.get_ssh_key(id).await)?.map(|k| self.key_state(&k, project_id)))
    }

    async fn update(
        &self,
        client: &MetalClient,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, ProviderError> {
        let id = state_id(prior)?;
        let req = SshKeyUpdateRequest {
            label: require_str(planned, "name")?.to_string(),
        };
        let key = client.update_ssh_key(id, &req).await?;
        Ok(self.key_state(&key, get_str(prior, "project_id")))
    }

    async fn delete(&self, client: &MetalClient, state: &Value) -> Result<(), ProviderError> {
        let id = state_id(state)?;
        gone_ok(client.delete_ssh_key(id).await)?;
        info!(ssh_key = id, "deleted ssh key");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metal::models::Href;

    fn key() -> SshKey {
        SshKey {
            id: "k1".into(),
            label: "tfacc-key".into(),
            key: "ssh-ed25519 AAAA test".into(),
            fingerprint: "aa:bb".into(),
            owner: Some(Href {
                id: None,
                href: Some("/metal/v1/projects/p1".into()),
            }),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn project_key_state_falls_back_to_owner() {
        let state = SshKeyResource::project().key_state(&key(), None);
        assert_eq!(state["project_id"], "p1");
        assert_eq!(state["owner_id"], "p1");

        let state = SshKeyResource::user().key_state(&key(), None);
        assert!(state.get("project_id").is_none());
        assert_eq!(state["name"], "tfacc-key");
    }

    #[test]
    fn public_key_change_replaces_but_rename_does_not() {
        let prior = json!({"id": "k1", "name": "a", "public_key": "ssh-ed25519 AAAA"});

        let plan = SshKeyResource::user()
            .plan(Some(&prior), &json!({"name": "b", "public_key": "ssh-ed25519 AAAA"}))
            .unwrap();
        assert!(!plan.requires_replace);

        let plan = SshKeyResource::user()
            .plan(Some(&prior), &json!({"name": "a", "public_key": "ssh-ed25519 BBBB"}))
            .unwrap();
        assert!(plan.requires_replace);
    }

    #[test]
    fn schemas_differ_by_project_id() {
        assert!(SshKeyResource::user().schema().attribute("project_id").is_none());
        let project = SshKeyResource::project().schema();
        assert!(project.attribute("project_id").unwrap().force_new);
    }
}
