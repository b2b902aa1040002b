//! `equinix_metal_project` lookup

use async_trait::async_trait;
use serde_json::Value;

use super::{merge, DataSource};
use crate::error::ProviderError;
use crate::metal::MetalClient;
use crate::resources::get_str;
use crate::resources::project::project_state;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Look up a project by id or by name.
pub struct ProjectDataSource;

#[async_trait]
impl DataSource for ProjectDataSource {
    fn type_name(&self) -> &'static str {
        "equinix_metal_project"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("An existing Metal project.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "project_id",
                Attribute::optional_computed_string().with_conflict("name"),
            )
            .with_attribute(
                "name",
                Attribute::optional_computed_string().with_conflict("project_id"),
            )
            .with_attribute("organization_id", Attribute::computed_string())
            .with_attribute("payment_method_id", Attribute::computed_string())
            .with_attribute("backend_transfer", Attribute::computed_bool())
            .with_attribute("created", Attribute::computed_string())
            .with_attribute("updated", Attribute::computed_string())
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = crate::validation::validate(&self.schema(), config);
        if get_str(config, "project_id").is_none() && get_str(config, "name").is_none() {
            diagnostics.push(Diagnostic::error(
                "one of \"project_id\" or \"name\" must be provided",
            ));
        }
        diagnostics
    }

    async fn read(&self, client: &MetalClient, config: &Value) -> Result<Value, ProviderError> {
        let project = match (get_str(config, "project_id"), get_str(config, "name")) {
            (Some(id), _) => client.get_project(id).await?,
            (None, Some(name)) => {
                let mut matches: Vec<_> = client
                    .list_projects()
                    .await?
                    .into_iter()
                    .filter(|p| p.name == name)
                    .collect();
                match matches.len() {
                    0 => {
                        return Err(ProviderError::NotFound(format!(
                            "no project named {:?}",
                            name
                        )))
                    },
                    1 => matches.remove(0),
                    n => {
                        return Err(ProviderError::Validation(format!(
                            "{} projects are named {:?}, use project_id instead",
                            n, name
                        )))
                    },
                }
            },
            (None, None) => {
                return Err(ProviderError::Validation(
                    "one of \"project_id\" or \"name\" must be provided".into(),
                ))
            },
        };

        let mut state = project_state(&project);
        state["project_id"] = Value::String(project.id.clone());
        Ok(merge(config, state))
    }
}
