//! `equinix_metal_device`
//!
//! A bare-metal server. Creation blocks until the device is `active`.
//! Changes to `operating_system`, `user_data` or `custom_data` replace the
//! device unless the `reinstall` block is enabled, in which case the
//! device is reinstalled in place.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{
    carry_over, changed, found, get_bool, get_str, get_string, get_strings, gone_ok, require_str,
    state_id, Resource,
};
use crate::diff;
use crate::error::ProviderError;
use crate::metal::models::{
    Device, DeviceAction, DeviceCreateRequest, DeviceUpdateRequest, IpAddress, NetworkPort,
};
use crate::metal::MetalClient;
use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, Schema};
use crate::types::PlanResult;
use crate::validation;

/// Operating system slug that boots from an iPXE script.
pub const CUSTOM_IPXE: &str = "custom_ipxe";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Attributes whose change needs a reinstall or a new device.
const REINSTALL_TRIGGERS: &[&str] = &["operating_system", "user_data", "custom_data"];

/// Inputs the API does not echo back; state keeps what was applied.
const WRITE_ONLY: &[&str] = &[
    "user_data",
    "custom_data",
    "termination_time",
    "facilities",
    "reinstall",
    "force_detach_volumes",
    "user_ssh_key_ids",
    "project_ssh_key_ids",
    "hardware_reservation_id",
    "project_id",
    "root_password",
];

/// Whether a user data payload is an iPXE script.
pub fn is_ipxe_script(user_data: &str) -> bool {
    user_data
        .trim_start()
        .strip_prefix("#!")
        .map(str::trim_start)
        .and_then(|rest| rest.get(..4))
        .is_some_and(|word| word.eq_ignore_ascii_case("ipxe"))
}

/// A Metal device.
#[derive(Debug, Clone)]
pub struct DeviceResource {
    poll_interval: Duration,
    create_timeout: Duration,
}

impl Default for DeviceResource {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            create_timeout: DEFAULT_CREATE_TIMEOUT,
        }
    }
}

impl DeviceResource {
    /// Override how often and how long provisioning is polled.
    pub fn with_polling(mut self, poll_interval: Duration, create_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.create_timeout = create_timeout;
        self
    }

    async fn wait_active(&self, client: &MetalClient, id: &str) -> Result<Device, ProviderError> {
        client
            .wait_for_device_active(id, self.create_timeout, self.poll_interval)
            .await
    }
}

fn reinstall_enabled(planned: &Value) -> bool {
    planned
        .get("reinstall")
        .is_some_and(|r| get_bool(r, "enabled"))
}

fn custom_data(planned: &Value) -> Result<Option<Value>, ProviderError> {
    get_str(planned, "custom_data")
        .map(|raw| {
            serde_json::from_str(raw).map_err(|e| {
                ProviderError::Validation(format!("\"custom_data\" must be valid JSON: {}", e))
            })
        })
        .transpose()
}

fn network_rank(ip: &IpAddress) -> u8 {
    match (ip.address_family, ip.public) {
        (4, true) => 0,
        (6, _) => 1,
        (4, false) => 2,
        _ => 3,
    }
}

/// IP assignments ordered public IPv4, IPv6, private IPv4.
fn sorted_networks(device: &Device) -> Vec<&IpAddress> {
    let mut networks: Vec<&IpAddress> = device.ip_addresses.iter().collect();
    networks.sort_by_key(|ip| network_rank(ip));
    networks
}

fn first_address(networks: &[&IpAddress], family: u8, public: bool) -> String {
    networks
        .iter()
        .find(|ip| ip.address_family == family && ip.public == public)
        .map(|ip| ip.address.clone())
        .unwrap_or_default()
}

fn network_type(ports: &[NetworkPort]) -> String {
    ports
        .iter()
        .find(|p| p.name == "bond0")
        .and_then(|p| p.network_type.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "layer3".to_string())
}

/// Flatten an API device into state, keeping write-only inputs from `inputs`.
pub(crate) fn device_state(device: &Device, inputs: &Value) -> Value {
    let networks = sorted_networks(device);
    let mut ports: Vec<&NetworkPort> = device.network_ports.iter().collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));

    let mut state = json!({
        "id": device.id,
        "hostname": device.hostname,
        "description": device.description,
        "state": device.state,
        "plan": device.plan.as_ref().map(|p| p.slug.clone()),
        "metro": device.metro.as_ref().map(|m| m.code.clone()),
        "deployed_facility": device.facility.as_ref().map(|f| f.code.clone()),
        "operating_system": device.operating_system.as_ref().map(|os| os.slug.clone()),
        "billing_cycle": device.billing_cycle.clone().unwrap_or_else(|| "hourly".into()),
        "tags": device.tags,
        "ipxe_script_url": device.ipxe_script_url.clone().unwrap_or_default(),
        "always_pxe": device.always_pxe,
        "locked": device.locked,
        "root_password": device.root_password,
        "network_type": network_type(&device.network_ports),
        "access_public_ipv4": first_address(&networks, 4, true),
        "access_public_ipv6": first_address(&networks, 6, true),
        "access_private_ipv4": first_address(&networks, 4, false),
        "network": networks.iter().map(|ip| json!({
            "address": ip.address,
            "gateway": ip.gateway,
            "family": ip.address_family,
            "cidr": ip.cidr,
            "public": ip.public,
        })).collect::<Vec<_>>(),
        "ports": ports.iter().map(|p| json!({
            "name": p.name,
            "id": p.id,
            "type": p.port_type,
            "mac": p.data.mac.clone().unwrap_or_default(),
            "bonded": p.data.bonded,
        })).collect::<Vec<_>>(),
        "ssh_key_ids": device.ssh_keys.iter().filter_map(|k| k.id()).collect::<Vec<_>>(),
        "project_id": device.project.as_ref().and_then(|p| p.id()),
        "hardware_reservation_id": device.hardware_reservation.as_ref().and_then(|h| h.id()),
        "created": device.created_at,
        "updated": device.updated_at,
    });

    carry_over(&mut state, inputs, WRITE_ONLY);
    state["force_detach_volumes"] = json!(get_bool(inputs, "force_detach_volumes"));
    state
}

#[async_trait]
impl Resource for DeviceResource {
    fn type_name(&self) -> &'static str {
        "equinix_metal_device"
    }

    fn schema(&self) -> Schema {
        let network = [
            ("address", AttributeType::String),
            ("gateway", AttributeType::String),
            ("family", AttributeType::Int64),
            ("cidr", AttributeType::Int64),
            ("public", AttributeType::Bool),
        ];
        let ports = [
            ("name", AttributeType::String),
            ("id", AttributeType::String),
            ("type", AttributeType::String),
            ("mac", AttributeType::String),
            ("bonded", AttributeType::Bool),
        ];

        Schema::v0()
            .with_description("A bare-metal device.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("hostname", Attribute::optional_computed_string())
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "plan",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Plan slug, e.g. c3.small.x86"),
            )
            .with_attribute(
                "metro",
                Attribute::optional_computed_string()
                    .with_force_new()
                    .with_conflict("facilities"),
            )
            .with_attribute(
                "facilities",
                Attribute::optional_string_list()
                    .with_force_new()
                    .with_conflict("metro"),
            )
            .with_attribute("operating_system", Attribute::required_string())
            .with_attribute(
                "billing_cycle",
                Attribute::optional_string().with_default(json!("hourly")),
            )
            .with_attribute("project_id", Attribute::required_string().with_force_new())
            .with_attribute("tags", Attribute::optional_string_list())
            .with_attribute("user_data", Attribute::optional_string().sensitive())
            .with_attribute("custom_data", Attribute::optional_string().sensitive())
            .with_attribute("ipxe_script_url", Attribute::optional_string())
            .with_attribute(
                "always_pxe",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute(
                "termination_time",
                Attribute::optional_string().with_description("RFC 3339 time of automatic deletion"),
            )
            .with_attribute(
                "user_ssh_key_ids",
                Attribute::optional_string_list().with_force_new(),
            )
            .with_attribute(
                "project_ssh_key_ids",
                Attribute::optional_string_list().with_force_new(),
            )
            .with_attribute(
                "hardware_reservation_id",
                Attribute::optional_string().with_force_new(),
            )
            .with_attribute("locked", Attribute::optional_bool().with_default(json!(false)))
            .with_attribute(
                "force_detach_volumes",
                Attribute::optional_bool().with_default(json!(false)),
            )
            .with_attribute("state", Attribute::computed_string())
            .with_attribute("deployed_facility", Attribute::computed_string())
            .with_attribute("network_type", Attribute::computed_string())
            .with_attribute("root_password", Attribute::computed_string().sensitive())
            .with_attribute("access_public_ipv4", Attribute::computed_string())
            .with_attribute("access_public_ipv6", Attribute::computed_string())
            .with_attribute("access_private_ipv4", Attribute::computed_string())
            .with_attribute("ssh_key_ids", Attribute::computed_string_list())
            .with_attribute("created", Attribute::computed_string())
            .with_attribute("updated", Attribute::computed_string())
            .with_attribute("network", Attribute::computed_object_list(network))
            .with_attribute("ports", Attribute::computed_object_list(ports))
            .with_block(
                "reinstall",
                NestedBlock::single(
                    Block::new()
                        .with_attribute("enabled", Attribute::optional_bool())
                        .with_attribute("preserve_data", Attribute::optional_bool())
                        .with_attribute("deprovision_fast", Attribute::optional_bool()),
                ),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        diagnostics.extend(validation::one_of(config, "billing_cycle", &["hourly", "monthly"]));

        if !validation::is_set(config.get("metro")) && !validation::is_set(config.get("facilities")) {
            diagnostics.push(
                Diagnostic::error("one of \"metro\" or \"facilities\" must be set")
                    .with_attribute("metro"),
            );
        }

        let os = get_str(config, "operating_system").unwrap_or_default();
        let ipxe_url = get_str(config, "ipxe_script_url");
        let user_data = get_str(config, "user_data");
        let user_data_is_ipxe = user_data.is_some_and(is_ipxe_script);

        if os == CUSTOM_IPXE {
            if ipxe_url.is_none() && !user_data_is_ipxe {
                diagnostics.push(
                    Diagnostic::error(
                        "\"ipxe_script_url\" or \"user_data\" must be provided when \"custom_ipxe\" OS is selected.",
                    )
                    .with_attribute("operating_system"),
                );
            }
        } else if get_bool(config, "always_pxe") && ipxe_url.is_none() {
            diagnostics.push(
                Diagnostic::error("\"ipxe_script_url\" must be provided when \"always_pxe\" is true.")
                    .with_attribute("ipxe_script_url"),
            );
        }

        if ipxe_url.is_some() && user_data_is_ipxe {
            diagnostics.push(
                Diagnostic::error(
                    "\"user_data\" should not be an iPXE script when \"ipxe_script_url\" is also defined.",
                )
                .with_attribute("user_data"),
            );
        }

        if let Some(time) = get_str(config, "termination_time") {
            if let Err(e) = chrono::DateTime::parse_from_rfc3339(time) {
                diagnostics.push(
                    Diagnostic::error(format!("\"termination_time\" is not an RFC 3339 time: {}", e))
                        .with_attribute("termination_time"),
                );
            }
        }

        if let Some(raw) = get_str(config, "custom_data") {
            if serde_json::from_str::<Value>(raw).is_err() {
                diagnostics.push(
                    Diagnostic::error("\"custom_data\" must be valid JSON")
                        .with_attribute("custom_data"),
                );
            }
        }

        diagnostics
    }

    fn plan(&self, prior: Option<&Value>, config: &Value) -> Result<PlanResult, ProviderError> {
        let schema = self.schema();
        let mut result = diff::plan(&schema, prior, config);

        let needs_rebuild = prior.is_some()
            && REINSTALL_TRIGGERS
                .iter()
                .any(|attr| result.change(attr).is_some());
        if needs_rebuild && !result.requires_replace && !reinstall_enabled(&result.planned_state) {
            diff::require_replacement(&schema, &mut result);
        }
        Ok(result)
    }

    async fn create(&self, client: &MetalClient, planned: &Value) -> Result<Value, ProviderError> {
        let project_id = require_str(planned, "project_id")?;
        let req = DeviceCreateRequest {
            hostname: get_string(planned, "hostname"),
            description: get_string(planned, "description"),
            plan: require_str(planned, "plan")?.to_string(),
            metro: get_string(planned, "metro"),
            facility: get_strings(planned, "facilities"),
            operating_system: require_str(planned, "operating_system")?.to_string(),
            billing_cycle: get_string(planned, "billing_cycle").unwrap_or_else(|| "hourly".into()),
            tags: get_strings(planned, "tags"),
            userdata: get_string(planned, "user_data"),
            customdata: custom_data(planned)?,
            ipxe_script_url: get_string(planned, "ipxe_script_url"),
            always_pxe: get_bool(planned, "always_pxe"),
            locked: get_bool(planned, "locked"),
            termination_time: get_string(planned, "termination_time"),
            hardware_reservation_id: get_string(planned, "hardware_reservation_id"),
            user_ssh_keys: get_strings(planned, "user_ssh_key_ids"),
            project_ssh_keys: get_strings(planned, "project_ssh_key_ids"),
        };

        let device = client.create_device(project_id, &req).await?;
        info!(device = %device.id, plan = %req.plan, "device requested, waiting for active");

        // Only the first responses carry the root password.
        let mut inputs = planned.clone();
        if let Some(password) = device.root_password.as_ref().filter(|p| !p.is_empty()) {
            inputs["root_password"] = json!(password);
        }

        let device = self.wait_active(client, &device.id).await?;
        info!(device = %device.id, "device active");
        Ok(device_state(&device, &inputs))
    }

    async fn read(
        &self,
        client: &MetalClient,
        state: &Value,
    ) -> Result<Option<Value>, ProviderError> {
        let id = state_id(state)?;
        Ok(found(client.get_device(id).await)?.map(|d| device_state(&d, state)))
    }

    async fn update(
        &self,
        client: &MetalClient,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, ProviderError> {
        let id = state_id(prior)?;
        let diff_str = |key: &str| changed(prior, planned, key).then(|| get_string(planned, key).unwrap_or_default());
        let diff_bool = |key: &str| changed(prior, planned, key).then(|| get_bool(planned, key));

        let mut req = DeviceUpdateRequest {
            hostname: diff_str("hostname"),
            description: diff_str("description"),
            billing_cycle: diff_str("billing_cycle"),
            ipxe_script_url: diff_str("ipxe_script_url"),
            always_pxe: diff_bool("always_pxe"),
            locked: diff_bool("locked"),
            userdata: diff_str("user_data"),
            termination_time: diff_str("termination_time"),
            ..Default::default()
        };
        if changed(prior, planned, "tags") {
            req.tags = Some(get_strings(planned, "tags"));
        }
        if changed(prior, planned, "custom_data") {
            req.customdata = Some(custom_data(planned)?.unwrap_or_else(|| json!({})));
        }

        // Unlocking has to happen before anything else can change.
        if req.locked == Some(false) && !req.is_empty() {
            let unlock = DeviceUpdateRequest {
                locked: Some(false),
                ..Default::default()
            };
            client.update_device(id, &unlock).await?;
        }

        let mut device = if req.is_empty() {
            client.get_device(id).await?
        } else {
            client.update_device(id, &req).await?
        };

        let reinstall = REINSTALL_TRIGGERS
            .iter()
            .any(|attr| changed(prior, planned, attr));
        if reinstall && reinstall_enabled(planned) {
            let options = planned.get("reinstall").cloned().unwrap_or_default();
            let action = DeviceAction::Reinstall {
                operating_system: get_string(planned, "operating_system"),
                preserve_data: get_bool(&options, "preserve_data"),
                deprovision_fast: get_bool(&options, "deprovision_fast"),
            };
            client.device_action(id, &action).await?;
            info!(device = id, "reinstalling device");
            device = self.wait_active(client, id).await?;
        }

        let mut inputs = planned.clone();
        carry_over(&mut inputs, prior, &["root_password"]);
        Ok(device_state(&device, &inputs))
    }

    async fn delete(&self, client: &MetalClient, state: &Value) -> Result<(), ProviderError> {
        let id = state_id(state)?;
        let force = get_bool(state, "force_detach_volumes");
        gone_ok(client.delete_device(id, force).await)?;
        info!(device = id, "deleted device");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metal::models::{Href, Location, PortData, SlugRef};
    use crate::schema::has_errors;

    fn ip(address: &str, family: u8, public: bool) -> IpAddress {
        IpAddress {
            address: address.into(),
            gateway: String::new(),
            address_family: family,
            cidr: if family == 6 { 127 } else { 31 },
            public,
        }
    }

    fn port(name: &str) -> NetworkPort {
        NetworkPort {
            id: format!("{}-id", name),
            name: name.into(),
            port_type: if name == "bond0" { "NetworkBondPort" } else { "NetworkPort" }.into(),
            data: PortData {
                mac: None,
                bonded: true,
            },
            network_type: (name == "bond0").then(|| "hybrid".to_string()),
        }
    }

    fn device() -> Device {
        Device {
            id: "d1".into(),
            hostname: "tfacc-device".into(),
            state: "active".into(),
            plan: Some(SlugRef {
                id: None,
                slug: "c3.small.x86".into(),
            }),
            metro: Some(Location {
                code: "sv".into(),
                ..Default::default()
            }),
            facility: Some(Location {
                code: "sv15".into(),
                ..Default::default()
            }),
            ip_addresses: vec![
                ip("10.0.0.2", 4, false),
                ip("2604:1380::1", 6, true),
                ip("147.75.0.1", 4, true),
            ],
            operating_system: Some(SlugRef {
                id: None,
                slug: "ubuntu_22_04".into(),
            }),
            network_ports: vec![port("eth1"), port("bond0"), port("eth0")],
            ssh_keys: vec![Href {
                id: None,
                href: Some("/metal/v1/ssh-keys/k1".into()),
            }],
            project: Some(Href {
                id: Some("p1".into()),
                href: None,
            }),
            ..Default::default()
        }
    }

    fn config() -> Value {
        json!({
            "plan": "c3.small.x86",
            "metro": "sv",
            "operating_system": "ubuntu_22_04",
            "project_id": "p1",
        })
    }

    #[test]
    fn ipxe_detection() {
        assert!(is_ipxe_script("#!ipxe\nchain http://boot"));
        assert!(is_ipxe_script("  #!IPXE\n"));
        assert!(is_ipxe_script("#! ipxe"));
        assert!(!is_ipxe_script("#!/bin/sh\necho ipxe"));
        assert!(!is_ipxe_script("#!ipx"));
        assert!(!is_ipxe_script("#!\u{e9}t\u{e9}"));
    }

    #[test]
    fn state_orders_networks_and_ports() {
        let state = device_state(&device(), &json!({"user_data": "#!/bin/sh"}));

        assert_eq!(state["network"][0]["address"], "147.75.0.1");
        assert_eq!(state["network"][1]["family"], 6);
        assert_eq!(state["network"][2]["public"], false);
        assert_eq!(state["access_public_ipv4"], "147.75.0.1");
        assert_eq!(state["access_public_ipv6"], "2604:1380::1");
        assert_eq!(state["access_private_ipv4"], "10.0.0.2");

        let names: Vec<_> = state["ports"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["bond0", "eth0", "eth1"]);

        assert_eq!(state["network_type"], "hybrid");
        assert_eq!(state["billing_cycle"], "hourly");
        assert_eq!(state["ipxe_script_url"], "");
        assert_eq!(state["deployed_facility"], "sv15");
        assert_eq!(state["ssh_key_ids"], json!(["k1"]));
        assert_eq!(state["user_data"], "#!/bin/sh");
        assert_eq!(state["force_detach_volumes"], false);
    }

    #[test]
    fn network_type_defaults_to_layer3() {
        assert_eq!(network_type(&[]), "layer3");
    }

    #[test]
    fn validate_custom_ipxe_requires_script() {
        let mut cfg = config();
        cfg["operating_system"] = json!("custom_ipxe");

        let diagnostics = DeviceResource::default().validate(&cfg);
        assert!(diagnostics
            .iter()
            .any(|d| d.summary.contains("must be provided when \"custom_ipxe\"")));

        cfg["user_data"] = json!("#!ipxe\nchain http://boot");
        assert!(!has_errors(&DeviceResource::default().validate(&cfg)));
    }

    #[test]
    fn validate_always_pxe_requires_url() {
        let mut cfg = config();
        cfg["always_pxe"] = json!(true);
        let diagnostics = DeviceResource::default().validate(&cfg);
        assert_eq!(
            diagnostics[0].summary,
            "\"ipxe_script_url\" must be provided when \"always_pxe\" is true."
        );
    }

    #[test]
    fn validate_ipxe_conflict() {
        let mut cfg = config();
        cfg["operating_system"] = json!("custom_ipxe");
        cfg["ipxe_script_url"] = json!("https://boot.netboot.xyz");
        cfg["user_data"] = json!("#!ipxe\nset conflict ipxe_script_url");

        let diagnostics = DeviceResource::default().validate(&cfg);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .summary
            .starts_with("\"user_data\" should not be an iPXE"));
    }

    #[test]
    fn validate_field_formats() {
        let mut cfg = config();
        cfg["termination_time"] = json!("tomorrow");
        cfg["billing_cycle"] = json!("weekly");
        cfg["facilities"] = json!(["sv15"]);

        let diagnostics = DeviceResource::default().validate(&cfg);
        let attrs: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert!(attrs.contains(&"termination_time"));
        assert!(attrs.contains(&"billing_cycle"));
        assert!(attrs.contains(&"facilities"));

        let mut cfg = config();
        cfg["termination_time"] = json!("2030-01-01T00:00:00Z");
        assert!(DeviceResource::default().validate(&cfg).is_empty());
    }

    #[test]
    fn validate_requires_a_location() {
        let mut cfg = config();
        cfg.as_object_mut().unwrap().remove("metro");

        let diagnostics = DeviceResource::default().validate(&cfg);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("metro"));
        assert!(diagnostics[0].summary.contains("\"metro\" or \"facilities\""));

        cfg["facilities"] = json!(["sv15"]);
        assert!(DeviceResource::default().validate(&cfg).is_empty());
    }

    #[test]
    fn user_data_change_replaces_without_reinstall() {
        let prior = device_state(&device(), &json!({"user_data": "#!/bin/sh\necho a"}));
        let mut cfg = config();
        cfg["hostname"] = json!("tfacc-device");
        cfg["user_data"] = json!("#!/bin/sh\necho b");

        let plan = DeviceResource::default().plan(Some(&prior), &cfg).unwrap();
        assert!(plan.requires_replace);
        assert!(plan.planned_state.get("id").is_none());

        cfg["reinstall"] = json!({"enabled": true, "deprovision_fast": true});
        let plan = DeviceResource::default().plan(Some(&prior), &cfg).unwrap();
        assert!(!plan.requires_replace);
        assert_eq!(plan.planned_state["id"], "d1");
    }

    #[test]
    fn hostname_and_tags_update_in_place() {
        let prior = device_state(&device(), &json!({}));
        let mut cfg = config();
        cfg["hostname"] = json!("renamed");
        cfg["tags"] = json!(["1"]);
        cfg["description"] = json!("desc");

        let plan = DeviceResource::default().plan(Some(&prior), &cfg).unwrap();
        assert!(!plan.requires_replace);
        assert!(plan.change("hostname").is_some());
        assert!(plan.change("tags").is_some());
        assert!(plan.change("description").is_some());
    }
}
