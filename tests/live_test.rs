// Acceptance tests against the real Metal API.
//
// Run with `METAL_AUTH_TOKEN=... cargo test --test live_test -- --ignored`.
// Objects are named with the sweeper prefix so leftovers can be removed
// with `equinix-provider sweep`.

use serde_json::json;

use equinix_provider::sweep::TEST_PREFIX;
use equinix_provider::testing::ProviderTester;
use equinix_provider::EquinixProvider;

fn token() -> Option<String> {
    std::env::var("METAL_AUTH_TOKEN").ok().filter(|t| !t.is_empty())
}

#[tokio::test]
#[ignore = "talks to the live Metal API"]
async fn test_live_project_and_key() {
    let Some(token) = token() else {
        eprintln!("METAL_AUTH_TOKEN not set, skipping");
        return;
    };

    let tester = ProviderTester::new(EquinixProvider::new());
    tester.configure(json!({"auth_token": token})).await.unwrap();

    let project_name = format!("{}project-{}", TEST_PREFIX, std::process::id());
    let project = tester
        .lifecycle_create("equinix_metal_project", json!({"name": project_name}))
        .await
        .unwrap();
    let project_id = project["id"].as_str().unwrap().to_string();

    let key = tester
        .lifecycle_crud(
            "equinix_metal_project_ssh_key",
            json!({
                "name": format!("{}key", TEST_PREFIX),
                "public_key": "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGmnq5FqfHqG3xEU6FfnXmY9T2xmNFv9Ra1kjjsB8y2u tfacc",
                "project_id": project_id,
            }),
            json!({
                "name": format!("{}key-renamed", TEST_PREFIX),
                "public_key": "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGmnq5FqfHqG3xEU6FfnXmY9T2xmNFv9Ra1kjjsB8y2u tfacc",
                "project_id": project_id,
            }),
        )
        .await
        .unwrap();
    assert_eq!(key["project_id"], project_id.as_str());

    let found = tester
        .read_data_source("equinix_metal_project", json!({"project_id": project_id}))
        .await
        .unwrap();
    assert_eq!(found["name"], project_name.as_str());

    tester
        .lifecycle_delete("equinix_metal_project", project)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "talks to the live Metal API"]
async fn test_live_plans() {
    let Some(token) = token() else {
        eprintln!("METAL_AUTH_TOKEN not set, skipping");
        return;
    };

    let tester = ProviderTester::new(EquinixProvider::new());
    tester.configure(json!({"auth_token": token})).await.unwrap();

    let state = tester
        .read_data_source(
            "equinix_metal_plans",
            json!({"filter": [{"attribute": "line", "values": ["baremetal"]}]}),
        )
        .await
        .unwrap();
    assert!(!state["plans"].as_array().unwrap().is_empty());
}
