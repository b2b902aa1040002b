//! Read-only data source types.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;
use crate::metal::MetalClient;
use crate::schema::{Diagnostic, Schema};
use crate::validation;

pub mod device;
pub mod filter;
pub mod plans;
pub mod project;

pub use device::DeviceDataSource;
pub use plans::PlansDataSource;
pub use project::ProjectDataSource;

/// A data source type.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name, e.g. `equinix_metal_plans`.
    fn type_name(&self) -> &'static str;

    /// Schema of the data source.
    fn schema(&self) -> Schema;

    /// Validate a data source configuration.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Look up the data and return the configuration with computed values filled in.
    async fn read(&self, client: &MetalClient, config: &Value) -> Result<Value, ProviderError>;
}

/// Data sources keyed by type name.
pub type DataSourceRegistry = BTreeMap<&'static str, Box<dyn DataSource>>;

/// Every data source the provider serves.
pub fn registry() -> DataSourceRegistry {
    let sources: Vec<Box<dyn DataSource>> = vec![
        Box::new(PlansDataSource),
        Box::new(ProjectDataSource),
        Box::new(DeviceDataSource),
    ];
    sources.into_iter().map(|s| (s.type_name(), s)).collect()
}

/// Merge computed values over the configuration.
pub(crate) fn merge(config: &Value, computed: Value) -> Value {
    let mut out = match config {
        Value::Object(obj) => obj.clone(),
        _ => serde_json::Map::new(),
    };
    if let Value::Object(computed) = computed {
        for (key, value) in computed {
            out.insert(key, value);
        }
    }
    Value::Object(out)
}
