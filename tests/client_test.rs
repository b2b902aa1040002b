// Integration tests for configuration, retries, plans and the sweeper.

mod common;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{provider_config, setup};
use equinix_provider::config::{ProviderConfig, MISSING_TOKEN};
use equinix_provider::metal::MetalClient;
use equinix_provider::sweep::sweep;
use equinix_provider::testing::{assert_error_contains, ProviderTester};
use equinix_provider::{EquinixProvider, ProviderError, ProviderService};

#[tokio::test]
async fn test_empty_token_is_reported() {
    let provider = EquinixProvider::new();
    let diagnostics = provider.configure(json!({"auth_token": ""})).await.unwrap();
    assert_error_contains(&diagnostics, MISSING_TOKEN);

    let err = provider.client().await.unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(_)));
}

#[tokio::test]
async fn test_stop_drops_the_client() {
    let server = MockServer::start().await;
    let tester = ProviderTester::new(EquinixProvider::new());
    tester.configure(provider_config(&server)).await.unwrap();
    assert_ok!(tester.provider().client().await);

    tester.stop().await.unwrap();
    assert_err!(tester.provider().client().await);
}

#[tokio::test]
async fn test_unavailable_response_is_retried() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metal/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "name": "tfacc-project"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = tester
        .read("equinix_metal_project", json!({"id": "p1"}))
        .await
        .unwrap();
    assert_eq!(state["name"], "tfacc-project");
}

#[tokio::test]
async fn test_retries_give_up_after_max_retries() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"errors": ["slow down"]})))
        .expect(3)
        .mount(&server)
        .await;

    let err = tester
        .read("equinix_metal_project", json!({"id": "p1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ResourceExhausted(_)), "{:?}", err);
    assert!(err.to_string().contains("slow down"));
}

#[tokio::test]
async fn test_forbidden_is_not_retried() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "forbidden"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = tester
        .read("equinix_metal_project", json!({"id": "p1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::PermissionDenied(_)), "{:?}", err);
}

#[tokio::test]
async fn test_plans_filtered_and_sorted() {
    let (server, tester) = setup().await;

    Mock::given(method("GET"))
        .and(path("/metal/v1/plans"))
        .and(query_param("include", "available_in,available_in_metros"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "plans": [
                {
                    "id": "pl1", "slug": "c3.small.x86", "name": "c3.small.x86", "line": "baremetal",
                    "pricing": {"hour": 0.75},
                    "available_in_metros": [{"code": "sv"}, {"code": "da"}]
                },
                {
                    "id": "pl2", "slug": "m3.large.x86", "name": "m3.large.x86", "line": "baremetal",
                    "pricing": {"hour": 3.1},
                    "available_in_metros": [{"code": "sv"}]
                },
                {
                    "id": "pl3", "slug": "n3.xlarge.x86", "name": "n3.xlarge.x86", "line": "baremetal",
                    "pricing": {"hour": 4.5},
                    "available_in_metros": [{"code": "ny"}]
                }
            ],
            "meta": {"current_page": 1, "last_page": 1}
        })))
        .mount(&server)
        .await;

    let config = json!({
        "filter": [
            {"attribute": "available_in_metros", "values": ["sv"]},
            {"attribute": "pricing_hour", "values": ["4"], "match_by": "less_than"}
        ],
        "sort": [{"attribute": "pricing_hour", "direction": "desc"}]
    });
    tester
        .validate_data_source_config("equinix_metal_plans", config.clone())
        .await
        .unwrap();

    let state = tester
        .read_data_source("equinix_metal_plans", config)
        .await
        .unwrap();
    let slugs: Vec<_> = state["plans"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["m3.large.x86", "c3.small.x86"]);
    assert_eq!(state["plans"][1]["available_in_metros"], json!(["sv", "da"]));

    let by_name = tester
        .read_data_source(
            "equinix_metal_plans",
            json!({"filter": [{"attribute": "name", "values": ["n3.xlarge.x86"]}]}),
        )
        .await
        .unwrap();
    assert_eq!(by_name["plans"].as_array().unwrap().len(), 1);
    assert_eq!(by_name["plans"][0]["id"], "pl3");
}

#[tokio::test]
async fn test_sweep_removes_only_test_objects() {
    let server = MockServer::start().await;
    let mut config = ProviderConfig::new("test-token", Url::parse(&server.uri()).unwrap());
    config.max_retries = 0;
    let client = MetalClient::new(&config).unwrap();

    Mock::given(method("GET"))
        .and(path("/metal/v1/projects"))
        .and(header("X-Auth-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projects": [
                {"id": "p1", "name": "tfacc-project"},
                {"id": "p2", "name": "production"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metal/v1/projects/p1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                {"id": "d1", "hostname": "tfacc-device"},
                {"id": "d2", "hostname": "web-1"},
                {"id": "d3", "hostname": "tfacc-locked"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metal/v1/devices/d1"))
        .and(query_param("force_delete", "true"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metal/v1/devices/d2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metal/v1/devices/d3"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"errors": ["device is locked"]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/metal/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metal/v1/projects/p2/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"devices": []})))
        .expect(0)
        .mount(&server)
        .await;

    let report = sweep(&client).await.unwrap();
    assert_eq!(report.devices_deleted, 1);
    assert_eq!(report.projects_deleted, 1);
    assert_eq!(report.failures, 1);
}
