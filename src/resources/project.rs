//! `equinix_metal_project`

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{changed, found, get_bool, get_string, gone_ok, require_str, state_id, Resource};
use crate::error::ProviderError;
use crate::metal::models::{Project, ProjectCreateRequest, ProjectUpdateRequest};
use crate::metal::MetalClient;
use crate::schema::{Attribute, Schema};

/// A Metal project.
pub struct ProjectResource;

/// Flatten an API project into state.
pub(crate) fn project_state(project: &Project) -> Value {
    json!({
        "id": project.id,
        "name": project.name,
        "organization_id": project.organization.as_ref().and_then(|o| o.id()),
        "payment_method_id": project.payment_method.as_ref().and_then(|p| p.id()),
        "backend_transfer": project.backend_transfer_enabled,
        "created": project.created_at,
        "updated": project.updated_at,
    })
}

#[async_trait]
impl Resource for ProjectResource {
    fn type_name(&self) -> &'static str {
        "equinix_metal_project"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A Metal project.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("created", Attribute::computed_string())
            .with_attribute("updated", Attribute::computed_string())
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Project name"),
            )
            .with_attribute(
                "organization_id",
                Attribute::optional_computed_string()
                    .with_force_new()
                    .with_description("Organization owning the project"),
            )
            .with_attribute("payment_method_id", Attribute::optional_computed_string())
            .with_attribute(
                "backend_transfer",
                Attribute::optional_bool()
                    .with_default(json!(false))
                    .with_description("Transfer between facilities over the backend network"),
            )
    }

    async fn create(&self, client: &MetalClient, planned: &Value) -> Result<Value, ProviderError> {
        let req = ProjectCreateRequest {
            name: require_str(planned, "name")?.to_string(),
            organization_id: get_string(planned, "organization_id"),
            payment_method_id: get_string(planned, "payment_method_id"),
        };
        let mut project = client.create_project(&req).await?;
        info!(project = %project.id, "created project");

        // Backend transfer can only be switched on after creation.
        if get_bool(planned, "backend_transfer") {
            let update = ProjectUpdateRequest {
                backend_transfer_enabled: Some(true),
                ..Default::default()
            };
            project = client.update_project(&project.id, &update).await?;
        }

        Ok(project_state(&project))
    }

    async fn read(
        &self,
        client: &MetalClient,
        state: &Value,
    ) -> Result<Option<Value>, ProviderError> {
        let id = state_id(state)?;
        Ok(found(client.get_project(id).await)?.map(|p| project_state(&p)))
    }

    async fn update(
        &self,
        client: &MetalClient,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, ProviderError> {
        let id = state_id(prior)?;
        let mut req = ProjectUpdateRequest::default();
        if changed(prior, planned, "name") {
            req.name = get_string(planned, "name");
        }
        if changed(prior, planned, "payment_method_id") {
            req.payment_method_id = get_string(planned, "payment_method_id");
        }
        if changed(prior, planned, "backend_transfer") {
            req.backend_transfer_enabled = Some(get_bool(planned, "backend_transfer"));
        }

        let project = client.update_project(id, &req).await?;
        Ok(project_state(&project))
    }

    async fn delete(&self, client: &MetalClient, state: &Value) -> Result<(), ProviderError> {
        let id = state_id(state)?;
        gone_ok(client.delete_project(id).await)?;
        info!(project = id, "deleted project");
        Ok(())
    }
}
