//! `equinix_metal_device` lookup

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{merge, DataSource};
use crate::error::ProviderError;
use crate::metal::MetalClient;
use crate::resources::device::device_state;
use crate::resources::{get_str, DeviceResource, Resource};
use crate::schema::{Attribute, AttributeFlags, Diagnostic, Schema};

/// Resource inputs that have no meaning on a looked-up device.
const INPUT_ONLY: &[&str] = &[
    "user_data",
    "custom_data",
    "facilities",
    "force_detach_volumes",
    "user_ssh_key_ids",
    "project_ssh_key_ids",
    "root_password",
];

/// Look up a device by id, or by hostname within a project.
pub struct DeviceDataSource;

#[async_trait]
impl DataSource for DeviceDataSource {
    fn type_name(&self) -> &'static str {
        "equinix_metal_device"
    }

    fn schema(&self) -> Schema {
        let resource = DeviceResource::default().schema();
        let mut schema = Schema::v0().with_description("An existing Metal device.");

        for (name, attr) in resource.block.attributes {
            if INPUT_ONLY.contains(&name.as_str()) {
                continue;
            }
            let flags = AttributeFlags {
                sensitive: attr.flags.sensitive,
                ..AttributeFlags::computed()
            };
            let mut computed = Attribute::new(attr.attr_type, flags);
            computed.description = attr.description;
            schema = schema.with_attribute(name, computed);
        }

        schema
            .with_attribute(
                "device_id",
                Attribute::optional_computed_string().with_conflict("hostname"),
            )
            .with_attribute(
                "hostname",
                Attribute::optional_computed_string().with_conflict("device_id"),
            )
            .with_attribute("project_id", Attribute::optional_computed_string())
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = crate::validation::validate(&self.schema(), config);
        let by_id = get_str(config, "device_id").is_some();
        let by_name = get_str(config, "hostname").is_some();
        if !by_id && !by_name {
            diagnostics.push(Diagnostic::error(
                "one of \"device_id\" or \"hostname\" must be provided",
            ));
        }
        if by_name && get_str(config, "project_id").is_none() {
            diagnostics.push(
                Diagnostic::error("\"project_id\" must be provided when looking up by \"hostname\"")
                    .with_attribute("project_id"),
            );
        }
        diagnostics
    }

    async fn read(&self, client: &MetalClient, config: &Value) -> Result<Value, ProviderError> {
        let device = if let Some(id) = get_str(config, "device_id") {
            client.get_device(id).await?
        } else {
            let hostname = get_str(config, "hostname").ok_or_else(|| {
                ProviderError::Validation("one of \"device_id\" or \"hostname\" must be provided".into())
            })?;
            let project_id = get_str(config, "project_id").ok_or_else(|| {
                ProviderError::Validation("\"project_id\" must be provided when looking up by \"hostname\"".into())
            })?;
            let mut matches: Vec<_> = client
                .list_devices(project_id)
                .await?
                .into_iter()
                .filter(|d| d.hostname == hostname)
                .collect();
            match matches.len() {
                1 => matches.remove(0),
                0 => {
                    return Err(ProviderError::NotFound(format!(
                        "no device with hostname {:?} in project {}",
                        hostname, project_id
                    )))
                },
                n => {
                    return Err(ProviderError::Validation(format!(
                        "{} devices have hostname {:?}, use device_id instead",
                        n, hostname
                    )))
                },
            }
        };

        let mut state = device_state(&device, &json!({}));
        if let Value::Object(obj) = &mut state {
            for key in INPUT_ONLY {
                obj.remove(*key);
            }
        }
        state["device_id"] = json!(device.id);
        state["termination_time"] = json!(device.termination_time);
        Ok(merge(config, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_computed_except_selectors() {
        let schema = DeviceDataSource.schema();
        assert!(schema.attribute("user_data").is_none());
        assert!(schema.attribute("plan").unwrap().flags.is_computed_only());
        assert!(!schema.attribute("plan").unwrap().force_new);
        assert!(schema.attribute("device_id").unwrap().flags.optional);
        assert!(schema.block.blocks.get("reinstall").is_none());
    }

    #[test]
    fn hostname_needs_project() {
        let diagnostics = DeviceDataSource.validate(&json!({"hostname": "tfacc"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("project_id"));

        assert!(DeviceDataSource
            .validate(&json!({"hostname": "tfacc", "project_id": "p1"}))
            .is_empty());
        assert!(DeviceDataSource.validate(&json!({"device_id": "d1"})).is_empty());
    }
}
