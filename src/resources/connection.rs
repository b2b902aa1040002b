//! `equinix_metal_connection`

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{
    carry_over, changed, found, get_str, get_string, get_strings, gone_ok, require_str, state_id,
    Resource,
};
use crate::error::ProviderError;
use crate::metal::models::{Connection, ConnectionCreateRequest, ConnectionUpdateRequest};
use crate::metal::MetalClient;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Diagnostic, Schema};
use crate::validation;

const MBPS: u64 = 1_000_000;
const GBPS: u64 = 1_000_000_000;

/// Parse a speed such as `50Mbps` or `10Gbps` into bits per second.
pub fn parse_speed(speed: &str) -> Result<u64, ProviderError> {
    let speed = speed.trim();
    let invalid = || {
        ProviderError::Validation(format!(
            "invalid speed {:?}, expected a value such as 50Mbps or 10Gbps",
            speed
        ))
    };

    let (digits, unit) = if let Some(n) = speed.strip_suffix("Gbps") {
        (n, GBPS)
    } else if let Some(n) = speed.strip_suffix("Mbps") {
        (n, MBPS)
    } else {
        return Err(invalid());
    };
    let value: u64 = digits.trim().parse().map_err(|_| invalid())?;
    value.checked_mul(unit).ok_or_else(invalid)
}

/// Format bits per second as the largest whole unit.
pub fn format_speed(bps: u64) -> String {
    if bps >= GBPS && bps % GBPS == 0 {
        format!("{}Gbps", bps / GBPS)
    } else {
        format!("{}Mbps", bps / MBPS)
    }
}

/// A Metal interconnection.
pub struct ConnectionResource;

fn connection_state(conn: &Connection, inputs: &Value) -> Value {
    let mut state = json!({
        "id": conn.id,
        "name": conn.name,
        "description": conn.description,
        "type": conn.connection_type,
        "redundancy": conn.redundancy,
        "speed": (conn.speed > 0).then(|| format_speed(conn.speed)),
        "mode": conn.mode.clone().unwrap_or_else(|| "standard".into()),
        "status": conn.status,
        "token": conn.token.clone().unwrap_or_default(),
        "tags": conn.tags,
        "metro": conn.metro.as_ref().map(|m| m.code.clone()),
        "contact_email": conn.contact_email,
        "ports": conn.ports.iter().map(|p| json!({
            "id": p.id,
            "name": p.name,
            "role": p.role,
            "speed": p.speed,
            "status": p.status,
        })).collect::<Vec<_>>(),
    });
    carry_over(&mut state, inputs, &["project_id", "vlans", "metro", "speed"]);
    state
}

#[async_trait]
impl Resource for ConnectionResource {
    fn type_name(&self) -> &'static str {
        "equinix_metal_connection"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A dedicated or shared interconnection.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("project_id", Attribute::required_string().with_force_new())
            .with_attribute("metro", Attribute::required_string().with_force_new())
            .with_attribute(
                "redundancy",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("primary or redundant"),
            )
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("dedicated or shared"),
            )
            .with_attribute(
                "speed",
                Attribute::optional_computed_string().with_description("e.g. 50Mbps or 10Gbps"),
            )
            .with_attribute("description", Attribute::optional_string())
            .with_attribute(
                "mode",
                Attribute::optional_string()
                    .with_default(json!("standard"))
                    .with_force_new(),
            )
            .with_attribute("tags", Attribute::optional_string_list())
            .with_attribute(
                "vlans",
                Attribute::new(
                    AttributeType::list(AttributeType::Int64),
                    AttributeFlags::optional(),
                )
                .with_force_new(),
            )
            .with_attribute("contact_email", Attribute::optional_computed_string())
            .with_attribute("status", Attribute::computed_string())
            .with_attribute("token", Attribute::computed_string().sensitive())
            .with_attribute(
                "ports",
                Attribute::computed_object_list([
                    ("id", AttributeType::String),
                    ("name", AttributeType::String),
                    ("role", AttributeType::String),
                    ("speed", AttributeType::Int64),
                    ("status", AttributeType::String),
                ]),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        diagnostics.extend(validation::one_of(config, "redundancy", &["primary", "redundant"]));
        diagnostics.extend(validation::one_of(config, "type", &["dedicated", "shared"]));
        diagnostics.extend(validation::one_of(config, "mode", &["standard", "tunnel"]));

        let shared = get_str(config, "type") == Some("shared");
        let has_vlans = validation::is_set(config.get("vlans"));
        if has_vlans && !shared {
            diagnostics.push(
                Diagnostic::error("\"vlans\" can only be set for shared connections")
                    .with_attribute("vlans"),
            );
        }
        match get_str(config, "speed") {
            Some(speed) => {
                if let Err(e) = parse_speed(speed) {
                    diagnostics.push(Diagnostic::error(e.to_string()).with_attribute("speed"));
                }
            },
            None if shared => diagnostics.push(
                Diagnostic::error("\"speed\" must be provided for shared connections")
                    .with_attribute("speed"),
            ),
            None => {},
        }
        diagnostics
    }

    async fn create(&self, client: &MetalClient, planned: &Value) -> Result<Value, ProviderError> {
        let project_id = require_str(planned, "project_id")?;
        let req = ConnectionCreateRequest {
            name: require_str(planned, "name")?.to_string(),
            metro: require_str(planned, "metro")?.to_string(),
            redundancy: require_str(planned, "redundancy")?.to_string(),
            connection_type: require_str(planned, "type")?.to_string(),
            speed: get_str(planned, "speed").map(parse_speed).transpose()?,
            description: get_string(planned, "description"),
            mode: get_string(planned, "mode"),
            tags: get_strings(planned, "tags"),
            vlans: planned
                .get("vlans")
                .and_then(Value::as_array)
                .map(|v| v.iter().filter_map(Value::as_i64).collect())
                .unwrap_or_default(),
            contact_email: get_string(planned, "contact_email"),
        };

        let conn = client.create_connection(project_id, &req).await?;
        info!(connection = %conn.id, "created connection");
        Ok(connection_state(&conn, planned))
    }

    async fn read(
        &self,
        client: &MetalClient,
        state: &Value,
    ) -> Result<Option<Value>, ProviderError> {
        let id = state_id(state)?;
        Ok(found(client.get_connection(id).await)?.map(|c| connection_state(&c, state)))
    }

    async fn update(
        &self,
        client: &MetalClient,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value, ProviderError> {
        let id = state_id(prior)?;
        let mut req = ConnectionUpdateRequest::default();
        if changed(prior, planned, "name") {
            req.name = get_string(planned, "name");
        }
        if changed(prior, planned, "description") {
            req.description = Some(get_string(planned, "description").unwrap_or_default());
        }
        if changed(prior, planned, "speed") {
            req.speed = get_str(planned, "speed").map(parse_speed).transpose()?;
        }
        if changed(prior, planned, "tags") {
            req.tags = Some(get_strings(planned, "tags"));
        }
        if changed(prior, planned, "contact_email") {
            req.contact_email = get_string(planned, "contact_email");
        }

        let conn = client.update_connection(id, &req).await?;
        Ok(connection_state(&conn, planned))
    }

    async fn delete(&self, client: &MetalClient, state: &Value) -> Result<(), ProviderError> {
        let id = state_id(state)?;
        gone_ok(client.delete_connection(id).await)?;
        info!(connection = id, "deleted connection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_conversion() {
        assert_eq!(parse_speed("50Mbps").unwrap(), 50_000_000);
        assert_eq!(parse_speed("10Gbps").unwrap(), 10_000_000_000);
        assert!(parse_speed("10 gigs").is_err());
        assert!(parse_speed("Mbps").is_err());

        assert_eq!(format_speed(50_000_000), "50Mbps");
        assert_eq!(format_speed(10_000_000_000), "10Gbps");
        assert_eq!(format_speed(1_500_000_000), "1500Mbps");
    }

    #[test]
    fn shared_rules() {
        let base = json!({
            "name": "c",
            "project_id": "p1",
            "metro": "sv",
            "redundancy": "primary",
            "type": "dedicated",
            "vlans": [1000],
        });
        let diagnostics = ConnectionResource.validate(&base);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("vlans"));

        let mut shared = base.clone();
        shared["type"] = json!("shared");
        let diagnostics = ConnectionResource.validate(&shared);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("speed"));

        shared["speed"] = json!("50Mbps");
        assert!(ConnectionResource.validate(&shared).is_empty());
    }

    #[test]
    fn state_formats_speed() {
        let conn = Connection {
            id: "c1".into(),
            speed: 50_000_000,
            ..Default::default()
        };
        let state = connection_state(&conn, &json!({"project_id": "p1", "vlans": [1000]}));
        assert_eq!(state["speed"], "50Mbps");
        assert_eq!(state["mode"], "standard");
        assert_eq!(state["project_id"], "p1");
        assert_eq!(state["vlans"], json!([1000]));
    }
}
