//! Equinix Metal API request and response bodies.
//!
//! Only the fields the provider reads or writes are modelled; everything
//! else in the API payloads is ignored.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// A reference to another API object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Href {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Href {
    /// The referenced id, taken from `id` or the last segment of `href`.
    pub fn id(&self) -> Option<String> {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return Some(id.to_string());
        }
        self.href
            .as_deref()
            .and_then(|h| h.trim_end_matches('/').rsplit('/').next())
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    }
}

/// A metro or facility reference with its short code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A plan or operating system reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: String,
}

/// Pagination metadata of list responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub next: Option<Href>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub last_page: Option<u32>,
}

impl Meta {
    /// Whether another page follows this one.
    pub fn has_next(&self) -> bool {
        if let (Some(current), Some(last)) = (self.current_page, self.last_page) {
            return current < last;
        }
        self.next.as_ref().is_some_and(|n| n.href.is_some())
    }
}

/// Error body of a failed API call.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ── Projects ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub organization: Option<Href>,
    #[serde(default)]
    pub payment_method: Option<Href>,
    #[serde(default)]
    pub backend_transfer_enabled: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectCreateRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_transfer_enabled: Option<bool>,
}

// ── SSH keys ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SshKey {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub owner: Option<Href>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SshKeyCreateRequest {
    pub label: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SshKeyUpdateRequest {
    pub label: String,
}

// ── Devices ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpAddress {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(default)]
    pub address_family: u8,
    #[serde(default)]
    pub cidr: u8,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortData {
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub bonded: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkPort {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub port_type: String,
    #[serde(default)]
    pub data: PortData,
    #[serde(default)]
    pub network_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub plan: Option<SlugRef>,
    #[serde(default)]
    pub metro: Option<Location>,
    #[serde(default)]
    pub facility: Option<Location>,
    #[serde(default)]
    pub operating_system: Option<SlugRef>,
    #[serde(default)]
    pub billing_cycle: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ipxe_script_url: Option<String>,
    #[serde(default)]
    pub always_pxe: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub root_password: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddress>,
    #[serde(default)]
    pub network_ports: Vec<NetworkPort>,
    #[serde(default)]
    pub ssh_keys: Vec<Href>,
    #[serde(default)]
    pub project: Option<Href>,
    #[serde(default)]
    pub hardware_reservation: Option<Href>,
    #[serde(default)]
    pub termination_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metro: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facility: Vec<String>,
    pub operating_system: String,
    pub billing_cycle: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userdata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipxe_script_url: Option<String>,
    pub always_pxe: bool,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_reservation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_ssh_keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_ssh_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipxe_script_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_pxe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userdata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customdata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_time: Option<String>,
}

impl DeviceUpdateRequest {
    /// Whether the request changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of `POST /devices/{id}/actions`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceAction {
    Reinstall {
        #[serde(skip_serializing_if = "Option::is_none")]
        operating_system: Option<String>,
        preserve_data: bool,
        deprovision_fast: bool,
    },
}

// ── Interconnections ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionPort {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub speed: u64,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Connection {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub connection_type: String,
    #[serde(default)]
    pub redundancy: String,
    #[serde(default)]
    pub speed: u64,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metro: Option<Location>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub ports: Vec<ConnectionPort>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionCreateRequest {
    pub name: String,
    pub metro: String,
    pub redundancy: String,
    #[serde(rename = "type")]
    pub connection_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vlans: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConnectionUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

// ── Plans ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub hour: Option<f64>,
    #[serde(default)]
    pub month: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plan {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub legacy: bool,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub deployment_types: Vec<String>,
    #[serde(default)]
    pub available_in: Vec<Location>,
    #[serde(default)]
    pub available_in_metros: Vec<Location>,
}
