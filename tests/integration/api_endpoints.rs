//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Collections and the digest are served as JSON
//! - Lifecycle failures answer 500 with an error payload
//! - Software versions support CRUD by index
//! - Authentication middleware functions properly

use std::net::SocketAddr;
use std::sync::Arc;

use opsboard::api::{ApiConfig, ApiState, spawn_api_server};
use opsboard::software::MemorySoftwareStore;
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{StubCertificates, config_for, dashboard};

const TOKEN: &str = "test-token";

async fn spawn_test_api(upstream: &MockServer) -> SocketAddr {
    let dashboard = dashboard(&config_for(upstream), StubCertificates::new(None), None);
    let state = ApiState::new(Arc::new(dashboard), Arc::new(MemorySoftwareStore::new()));

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        auth_token: Some(TOKEN.to_string()),
        enable_cors: true,
    };

    spawn_api_server(config, state).await.unwrap()
}

fn get(addr: SocketAddr, route: &str) -> reqwest::RequestBuilder {
    reqwest::Client::new()
        .get(format!("http://{addr}{route}"))
        .bearer_auth(TOKEN)
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let upstream = MockServer::start().await;
    let addr = spawn_test_api(&upstream).await;

    let response = get(addr, "/api/health").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["cache"]["backend"], "memory");
    assert_eq!(json["cache"]["healthy"], true);
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let upstream = MockServer::start().await;
    let addr = spawn_test_api(&upstream).await;

    let response = reqwest::get(format!("http://{addr}/api/modules")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = reqwest::Client::new()
        .get(format!("http://{addr}/api/modules"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_collections_with_empty_roster() {
    let upstream = MockServer::start().await;
    let addr = spawn_test_api(&upstream).await;

    for route in [
        "/api/modules",
        "/api/terraform-providers",
        "/api/github-releases",
        "/api/vendor-versions",
        "/api/check_website?force=true",
    ] {
        let response = get(addr, route).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{route}");
        let json: Value = response.json().await.unwrap();
        assert_eq!(json, json!([]), "{route}");
    }
}

#[tokio::test]
async fn test_system_status_shape() {
    let upstream = MockServer::start().await;
    let addr = spawn_test_api(&upstream).await;

    // caches an empty module collection
    get(addr, "/api/modules").send().await.unwrap();

    let json: Value = get(addr, "/api/system-status")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["modules"]["severity"], "ok");
    assert_eq!(json["providers"]["severity"], "unknown");
    assert_eq!(json["providers"]["detail"], "no data yet");
    assert_eq!(json["websites"]["severity"], "unknown");
    assert!(json["generatedAt"].is_string());
}

#[tokio::test]
async fn test_eol_failure_answers_500() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/debian.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;
    let addr = spawn_test_api(&upstream).await;

    let response = get(addr, "/api/eol/debian").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json: Value = response.json().await.unwrap();
    assert_eq!(
        json["error"],
        "Failed to fetch debian EOL data: upstream answered with HTTP 500"
    );
}

#[tokio::test]
async fn test_eol_passes_cycles_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sles.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "cycle": "15.6", "eol": "2031-07-31", "lts": false }
        ])))
        .mount(&upstream)
        .await;
    let addr = spawn_test_api(&upstream).await;

    let json: Value = get(addr, "/api/eol/sles")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json[0]["cycle"], "15.6");
    assert_eq!(json[0]["eol"], "2031-07-31");
    assert_eq!(json[0]["lts"], false);
}

#[tokio::test]
async fn test_software_versions_crud() {
    let upstream = MockServer::start().await;
    let addr = spawn_test_api(&upstream).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/software_versions");

    let entry = json!({
        "name": "git",
        "currentVersion": "2.47.0",
        "category": "tools"
    });
    let response = client
        .post(&url)
        .bearer_auth(TOKEN)
        .json(&entry)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["index"], 0);

    let response = client
        .put(format!("{url}/0"))
        .bearer_auth(TOKEN)
        .json(&json!({ "name": "git", "currentVersion": "2.48.1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .put(format!("{url}/3"))
        .bearer_auth(TOKEN)
        .json(&entry)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: Value = response.json().await.unwrap();
    assert!(json["error"].is_string());

    let list: Value = get(addr, "/api/software_versions")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list[0]["currentVersion"], "2.48.1");

    let response = client
        .delete(format!("{url}/0"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let removed: Value = response.json().await.unwrap();
    assert_eq!(removed["name"], "git");

    let list: Value = get(addr, "/api/software_versions")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list, json!([]));
}
