// Integration tests for `equinix_metal_device` against a mocked Metal API.

mod common;

use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{device_body, device_config, setup};
use equinix_provider::config::ProviderConfig;
use equinix_provider::testing::{assert_error_contains, assert_plan_replaces, ProviderTester};
use equinix_provider::{EquinixProvider, ProviderError, ProviderService};

const DEVICE: &str = "equinix_metal_device";

#[tokio::test]
async fn test_create_waits_for_active_and_fills_defaults() {
    let (server, tester) = setup().await;

    let mut provisioning = device_body("d1", "tfacc-device", "provisioning");
    provisioning["root_password"] = json!("s3cret-pw");

    Mock::given(method("POST"))
        .and(path("/metal/v1/projects/p1/devices"))
        .and(header("X-Auth-Token", "test-token"))
        .and(body_partial_json(json!({
            "hostname": "tfacc-device",
            "plan": "c3.small.x86",
            "metro": "sv",
            "operating_system": "ubuntu_22_04",
            "billing_cycle": "hourly",
            "always_pxe": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(&provisioning))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/devices/d1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_body("d1", "tfacc-device", "active")),
        )
        .mount(&server)
        .await;

    let state = tester.lifecycle_create(DEVICE, device_config()).await.unwrap();

    assert_eq!(state["id"], "d1");
    assert_eq!(state["state"], "active");
    assert_eq!(state["billing_cycle"], "hourly");
    assert_eq!(state["network_type"], "layer3");
    assert_eq!(state["ipxe_script_url"], "");
    assert_eq!(state["always_pxe"], false);
    assert_eq!(state["root_password"], "s3cret-pw");
    assert_eq!(state["deployed_facility"], "sv15");
    assert_eq!(state["project_id"], "p1");
    assert_eq!(state["ssh_key_ids"], json!(["k1"]));

    assert_eq!(state["access_public_ipv4"], "147.75.80.11");
    assert_eq!(state["access_public_ipv6"], "2604:1380:4641::1");
    assert_eq!(state["access_private_ipv4"], "10.70.0.3");
    let families: Vec<_> = state["network"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| (n["family"].as_i64().unwrap(), n["public"].as_bool().unwrap()))
        .collect();
    assert_eq!(families, vec![(4, true), (6, true), (4, false)]);

    let ports: Vec<_> = state["ports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(ports, vec!["bond0", "eth0", "eth1"]);
    assert_eq!(state["ports"][1]["mac"], "aa:bb:cc:00:00:01");
}

#[tokio::test]
async fn test_create_fails_when_device_fails() {
    let (server, tester) = setup().await;

    Mock::given(method("POST"))
        .and(path("/metal/v1/projects/p1/devices"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(device_body("d1", "tfacc-device", "provisioning")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metal/v1/devices/d1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_body("d1", "tfacc-device", "failed")),
        )
        .mount(&server)
        .await;

    let err = tester.lifecycle_create(DEVICE, device_config()).await.unwrap_err();
    assert!(err.to_string().contains("entered state failed"), "{}", err);
}

#[tokio::test]
async fn test_hostname_update_keeps_id() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/devices/d1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_body("d1", "tfacc-device", "active")),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/metal/v1/devices/d1"))
        .and(body_partial_json(json!({"hostname": "tfacc-renamed"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_body("d1", "tfacc-renamed", "active")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let prior = tester
        .read(DEVICE, json!({"id": "d1", "project_id": "p1"}))
        .await
        .unwrap();

    let mut config = device_config();
    config["hostname"] = json!("tfacc-renamed");
    let plan = tester.plan_update(DEVICE, prior.clone(), config).await.unwrap();
    assert!(!plan.requires_replace);
    assert!(plan.change("hostname").is_some());

    let updated = tester.update(DEVICE, prior, plan.planned_state).await.unwrap();
    assert_eq!(updated["id"], "d1");
    assert_eq!(updated["hostname"], "tfacc-renamed");
}

#[tokio::test]
async fn test_user_data_change_reinstalls_in_place() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/devices/d1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_body("d1", "tfacc-device", "active")),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/metal/v1/devices/d1"))
        .and(body_partial_json(json!({"userdata": "#!/bin/sh\necho b"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_body("d1", "tfacc-device", "active")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/metal/v1/devices/d1/actions"))
        .and(body_partial_json(json!({
            "type": "reinstall",
            "operating_system": "ubuntu_22_04",
            "deprovision_fast": true
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let prior = tester
        .read(
            DEVICE,
            json!({"id": "d1", "project_id": "p1", "user_data": "#!/bin/sh\necho a"}),
        )
        .await
        .unwrap();

    let mut config = device_config();
    config["user_data"] = json!("#!/bin/sh\necho b");
    let plan = tester
        .plan_update(DEVICE, prior.clone(), config.clone())
        .await
        .unwrap();
    assert_plan_replaces(&plan);

    config["reinstall"] = json!({"enabled": true, "deprovision_fast": true});
    let plan = tester.plan_update(DEVICE, prior.clone(), config).await.unwrap();
    assert!(!plan.requires_replace);

    let updated = tester.update(DEVICE, prior, plan.planned_state).await.unwrap();
    assert_eq!(updated["id"], "d1");
    assert_eq!(updated["user_data"], "#!/bin/sh\necho b");
}

#[tokio::test]
async fn test_import_matches_read() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/devices/d1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_body("d1", "tfacc-device", "active")),
        )
        .mount(&server)
        .await;

    let imported = tester.import_state(DEVICE, "d1").await.unwrap();
    let read = tester.read(DEVICE, json!({"id": "d1"})).await.unwrap();
    assert_eq!(imported, read);
    assert_eq!(imported["project_id"], "p1");
}

#[tokio::test]
async fn test_read_missing_device_is_null() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/devices/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": ["Not found"]})))
        .mount(&server)
        .await;

    let state = tester.read(DEVICE, json!({"id": "gone"})).await.unwrap();
    assert_eq!(state, Value::Null);
}

#[tokio::test]
async fn test_delete_forces_volume_detach_when_asked() {
    let (server, tester) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/metal/v1/devices/d1"))
        .and(query_param("force_delete", "true"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metal/v1/devices/d2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    tester
        .lifecycle_delete(DEVICE, json!({"id": "d1", "force_detach_volumes": true}))
        .await
        .unwrap();
    // Already gone counts as deleted.
    tester.delete(DEVICE, json!({"id": "d2"})).await.unwrap();
}

#[tokio::test]
async fn test_ipxe_rules() {
    let (_server, tester) = setup().await;

    let mut config = device_config();
    config["operating_system"] = json!("custom_ipxe");
    let diagnostics = tester.resource_diagnostics(DEVICE, config.clone()).await.unwrap();
    assert_error_contains(
        &diagnostics,
        "\"ipxe_script_url\" or \"user_data\" must be provided when \"custom_ipxe\" OS is selected.",
    );

    config["ipxe_script_url"] = json!("https://boot.netboot.xyz");
    tester.validate_resource_config(DEVICE, config).await.unwrap();

    let mut config = device_config();
    config["always_pxe"] = json!(true);
    let diagnostics = tester.resource_diagnostics(DEVICE, config).await.unwrap();
    assert_error_contains(
        &diagnostics,
        "\"ipxe_script_url\" must be provided when \"always_pxe\" is true.",
    );
}

#[tokio::test]
async fn test_metro_and_facilities_conflict() {
    let (_server, tester) = setup().await;

    let mut config = device_config();
    config["facilities"] = json!(["sv15"]);
    let diagnostics = tester
        .provider()
        .validate_resource_config(DEVICE, config)
        .await
        .unwrap();
    let conflicts: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.is_error() && d.summary == "Conflicting configuration arguments")
        .collect();
    assert_eq!(conflicts.len(), 1);
}

#[tokio::test]
async fn test_device_data_source_lookup_by_hostname() {
    let server = MockServer::start().await;
    let mut config = ProviderConfig::new("test-token", Url::parse(&server.uri()).unwrap());
    config.max_retries = 0;
    let tester = ProviderTester::new(EquinixProvider::with_config(&config).unwrap());

    Mock::given(method("GET"))
        .and(path("/metal/v1/projects/p1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                device_body("d1", "tfacc-web", "active"),
                device_body("d2", "tfacc-db", "active"),
                device_body("d3", "tfacc-db", "active")
            ]
        })))
        .mount(&server)
        .await;

    let state = tester
        .read_data_source(DEVICE, json!({"hostname": "tfacc-web", "project_id": "p1"}))
        .await
        .unwrap();
    assert_eq!(state["device_id"], "d1");
    assert_eq!(state["id"], "d1");
    assert_eq!(state["state"], "active");
    assert_eq!(state["access_public_ipv4"], "147.75.80.11");
    assert!(state.get("user_data").is_none());

    let err = tester
        .read_data_source(DEVICE, json!({"hostname": "tfacc-missing", "project_id": "p1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)), "{:?}", err);

    let err = tester
        .read_data_source(DEVICE, json!({"hostname": "tfacc-db", "project_id": "p1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation(_)), "{:?}", err);
    assert!(err.to_string().contains("2 devices have hostname"));
}

#[tokio::test]
async fn test_device_data_source_lookup_by_id() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/devices/d1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(device_body("d1", "tfacc-device", "active")),
        )
        .expect(1)
        .mount(&server)
        .await;

    tester
        .validate_data_source_config(DEVICE, json!({"device_id": "d1"}))
        .await
        .unwrap();
    let state = tester
        .read_data_source(DEVICE, json!({"device_id": "d1"}))
        .await
        .unwrap();
    assert_eq!(state["hostname"], "tfacc-device");
    assert_eq!(state["plan"], "c3.small.x86");
}
