// Shared setup for the wiremock-backed integration tests.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::MockServer;

use equinix_provider::testing::ProviderTester;
use equinix_provider::EquinixProvider;

pub async fn setup() -> (MockServer, ProviderTester<EquinixProvider>) {
    let server = MockServer::start().await;
    let provider = EquinixProvider::new()
        .with_device_polling(Duration::from_millis(10), Duration::from_secs(5));
    let tester = ProviderTester::new(provider);
    tester.configure(provider_config(&server)).await.unwrap();
    (server, tester)
}

pub fn provider_config(server: &MockServer) -> Value {
    json!({
        "auth_token": "test-token",
        "endpoint": server.uri(),
        "max_retries": 2,
        "max_retry_wait_seconds": 0,
    })
}

pub fn device_body(id: &str, hostname: &str, state: &str) -> Value {
    json!({
        "id": id,
        "hostname": hostname,
        "state": state,
        "plan": {"slug": "c3.small.x86"},
        "metro": {"code": "sv"},
        "facility": {"code": "sv15"},
        "operating_system": {"slug": "ubuntu_22_04"},
        "billing_cycle": "hourly",
        "tags": [],
        "always_pxe": false,
        "locked": false,
        "project": {"href": "/metal/v1/projects/p1"},
        "ssh_keys": [{"href": "/metal/v1/ssh-keys/k1"}],
        "ip_addresses": [
            {"address": "10.70.0.3", "gateway": "10.70.0.2", "address_family": 4, "cidr": 31, "public": false},
            {"address": "2604:1380:4641::1", "gateway": "2604:1380:4641::", "address_family": 6, "cidr": 127, "public": true},
            {"address": "147.75.80.11", "gateway": "147.75.80.10", "address_family": 4, "cidr": 31, "public": true}
        ],
        "network_ports": [
            {"id": "port-eth1", "name": "eth1", "type": "NetworkPort", "data": {"mac": "aa:bb:cc:00:00:02", "bonded": true}},
            {"id": "port-bond0", "name": "bond0", "type": "NetworkBondPort", "data": {"bonded": true}},
            {"id": "port-eth0", "name": "eth0", "type": "NetworkPort", "data": {"mac": "aa:bb:cc:00:00:01", "bonded": true}}
        ],
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:05:00Z"
    })
}

pub fn device_config() -> Value {
    json!({
        "hostname": "tfacc-device",
        "plan": "c3.small.x86",
        "metro": "sv",
        "operating_system": "ubuntu_22_04",
        "project_id": "p1",
    })
}
