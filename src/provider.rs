//! The Equinix provider: configuration and routing of protocol calls to
//! resource and data source types.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::{self, ProviderConfig, MIN_PAGE_SIZE};
use crate::data_sources::{self, DataSource, DataSourceRegistry};
use crate::error::ProviderError;
use crate::metal::MetalClient;
use crate::resources::{self, DeviceResource, Resource, ResourceRegistry};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

const NOT_CONFIGURED: &str = "the provider has not been configured";

/// Equinix Metal provider.
pub struct EquinixProvider {
    resources: ResourceRegistry,
    data_sources: DataSourceRegistry,
    client: RwLock<Option<Arc<MetalClient>>>,
}

impl Default for EquinixProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EquinixProvider {
    /// An unconfigured provider serving every resource and data source.
    pub fn new() -> Self {
        Self {
            resources: resources::registry(),
            data_sources: data_sources::registry(),
            client: RwLock::new(None),
        }
    }

    /// A provider already configured with `config`.
    pub fn with_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = MetalClient::new(config)?;
        Ok(Self {
            client: RwLock::new(Some(Arc::new(client))),
            ..Self::new()
        })
    }

    /// Change how often and how long device provisioning is polled.
    pub fn with_device_polling(mut self, poll_interval: Duration, create_timeout: Duration) -> Self {
        let device = DeviceResource::default().with_polling(poll_interval, create_timeout);
        self.resources.insert(device.type_name(), Box::new(device));
        self
    }

    /// The configured API client.
    pub async fn client(&self) -> Result<Arc<MetalClient>, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Configuration(NOT_CONFIGURED.into()))
    }

    fn resource(&self, type_name: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    fn data_source(&self, type_name: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(type_name)
            .map(|d| d.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }
}

#[async_trait::async_trait]
impl ProviderService for EquinixProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = ProviderSchema::new().with_provider_config(config::schema());
        let schema = self
            .resources
            .iter()
            .fold(schema, |s, (name, r)| s.with_resource(*name, r.schema()));
        self.data_sources
            .iter()
            .fold(schema, |s, (name, d)| s.with_data_source(*name, d.schema()))
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&config::schema(), &config);
        let page_size = config.get("response_max_page_size").and_then(Value::as_i64);
        if page_size.is_some_and(|n| n < i64::from(MIN_PAGE_SIZE)) {
            diagnostics.push(
                Diagnostic::error(format!(
                    "response_max_page_size must be at least {}",
                    MIN_PAGE_SIZE
                ))
                .with_attribute("response_max_page_size"),
            );
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = match ProviderConfig::resolve(&config) {
            Ok(config) => config,
            Err(ProviderError::Configuration(msg)) => return Ok(vec![Diagnostic::error(msg)]),
            Err(e) => return Err(e),
        };
        let client = MetalClient::new(&config)?;
        *self.client.write().await = Some(Arc::new(client));
        info!(endpoint = %config.endpoint, page_size = config.response_max_page_size, "configured Metal client");
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let version = u64::try_from(version).map_err(|_| {
            ProviderError::Validation(format!("invalid schema version {}", version))
        })?;
        self.resource(resource_type)?.upgrade_state(version, state)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        let config = if config.is_null() { proposed_state } else { config };
        if config.is_null() {
            debug!(resource_type, "planning destroy");
            return Ok(PlanResult::no_change(Value::Null));
        }
        resource.plan(prior_state.as_ref(), &config)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.create(&client, &planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        Ok(resource
            .read(&client, &current_state)
            .await?
            .unwrap_or(Value::Null))
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.update(&client, &prior_state, &planned_state).await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        resource.delete(&client, &current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client().await?;
        let state = resource.import(&client, id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.data_source(data_source_type)?.validate(&config))
    }

    async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client().await?;
        data_source.read(&client, &config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_lists_everything() {
        let schema = EquinixProvider::new().schema();
        assert_eq!(schema.resources.len(), 5);
        assert_eq!(schema.data_sources.len(), 3);
        assert!(schema.provider.attribute("auth_token").unwrap().flags.sensitive);
    }

    #[tokio::test]
    async fn operations_need_configuration() {
        let provider = EquinixProvider::new();
        let err = provider
            .read("equinix_metal_project", json!({"id": "p1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn unknown_types_are_rejected() {
        let provider = EquinixProvider::new();
        let err = provider
            .validate_resource_config("equinix_metal_volume", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn destroy_plan_is_null() {
        let provider = EquinixProvider::new();
        let plan = provider
            .plan("equinix_metal_ssh_key", Some(json!({"id": "k1"})), Value::Null, Value::Null)
            .await
            .unwrap();
        assert!(plan.planned_state.is_null());
    }

    #[tokio::test]
    async fn small_page_size_is_rejected() {
        let diagnostics = EquinixProvider::new()
            .validate_provider_config(json!({"response_max_page_size": 5}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("response_max_page_size"));
    }
}
