//! Version and lifecycle sources through the dashboard
//!
//! These tests verify that:
//! - Every source normalizes its upstream into status records
//! - Failures become error records without affecting their neighbours
//! - Collections are served from the cache until forced
//! - Lifecycle data is filtered by the allow-list

use std::collections::BTreeMap;
use std::time::Duration;

use assert_matches::assert_matches;
use opsboard::config::{GitHubConfig, ModuleConfig, ProviderConfig, VendorConfig};
use opsboard::fetchers::{EolDate, FetchError};
use opsboard::{ErrorKind, ItemState, NOT_AVAILABLE};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{StubCertificates, config_for, dashboard};

fn module(name: &str, installed: Option<&str>) -> ModuleConfig {
    ModuleConfig {
        name: name.to_string(),
        installed: installed.map(str::to_string),
    }
}

#[tokio::test]
async fn test_forge_modules_keep_roster_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/modules/puppetlabs-apt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_release": { "version": "10.1.0" },
            "deprecated_at": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/modules/puppet-archive"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/modules/puppet-systemd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_release": { "version": "8.2.0" },
            "deprecated_at": null
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.modules = vec![
        module("puppetlabs-apt", Some("10.0.1")),
        module("puppet-archive", Some("7.1.0")),
        module("puppet-systemd", Some("8.2.0")),
    ];
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let records = dashboard.list_modules().await;

    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["puppetlabs-apt", "puppet-archive", "puppet-systemd"]);

    assert_eq!(records[0].state, ItemState::Outdated);
    assert_eq!(records[0].latest_version.as_deref(), Some("10.1.0"));
    assert_eq!(
        records[0].metadata["url"],
        "https://forge.puppet.com/modules/puppetlabs/apt"
    );

    assert_eq!(records[1].state, ItemState::Error);
    assert_eq!(records[1].error_kind, Some(ErrorKind::Upstream));
    assert_eq!(records[1].latest_version, None);

    assert_eq!(records[2].state, ItemState::Current);

    let raw = serde_json::to_value(&records[1]).unwrap();
    assert_eq!(raw["latestVersion"], NOT_AVAILABLE);
    assert_eq!(raw["state"], "error");
}

#[tokio::test]
async fn test_deprecated_module() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/modules/dsc-auditpolicydsc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_release": { "version": "1.4.0-0-9" },
            "deprecated_at": "2023-05-02 10:11:12 -0700"
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.modules = vec![module("dsc-auditpolicydsc", Some("1.4.0-0-9"))];
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let records = dashboard.list_modules().await;
    assert_eq!(records[0].state, ItemState::Deprecated);
    assert_eq!(records[0].metadata["deprecatedAt"], "2023-05-02 10:11:12 -0700");
}

#[tokio::test]
async fn test_forge_timeout_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/modules/puppetlabs-apt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "current_release": { "version": "10.1.0" },
                    "deprecated_at": null
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.sources.timeout = 1;
    config.modules = vec![module("puppetlabs-apt", Some("10.0.1"))];
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let records = dashboard.list_modules().await;
    assert_eq!(records[0].state, ItemState::Error);
    assert_eq!(records[0].error_kind, Some(ErrorKind::Timeout));
    assert_eq!(records[0].detail.as_deref(), Some("timeout"));
    assert_eq!(records[0].latest_version, None);
}

#[tokio::test]
async fn test_modules_are_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/modules/puppetlabs-apt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_release": { "version": "10.1.0" },
            "deprecated_at": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.modules = vec![module("puppetlabs-apt", None)];
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let first = dashboard.list_modules().await;
    let second = dashboard.list_modules().await;

    assert_eq!(first, second);
    assert_eq!(first[0].state, ItemState::Unknown);
}

#[tokio::test]
async fn test_terraform_provider_ignores_leading_v() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/providers/hashicorp/azurerm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "hashicorp/azurerm/4.10.0",
            "version": "4.10.0"
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.terraform_providers = vec![ProviderConfig {
        namespace: "hashicorp".to_string(),
        name: "azurerm".to_string(),
        display: Some("Azure".to_string()),
        installed: Some("v4.10.0".to_string()),
    }];
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let records = dashboard.list_terraform_providers().await;
    assert_eq!(records[0].state, ItemState::Current);
    assert_eq!(records[0].metadata["namespace"], "hashicorp");
    assert_eq!(records[0].metadata["displayName"], "Azure");
}

#[tokio::test]
async fn test_github_release() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/agent/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag_name": "v1.3.0",
            "html_url": "https://github.com/acme/agent/releases/tag/v1.3.0",
            "published_at": "2026-02-01T08:00:00Z"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/empty/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tag_name": "" })))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.github = vec![
        GitHubConfig {
            repo: "acme/agent".to_string(),
            display: Some("Agent".to_string()),
            installed: Some("1.2.0".to_string()),
        },
        GitHubConfig {
            repo: "acme/empty".to_string(),
            display: None,
            installed: None,
        },
    ];
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let records = dashboard.list_github_releases().await;
    assert_eq!(records[0].name, "Agent");
    assert_eq!(records[0].state, ItemState::Outdated);
    assert_eq!(records[0].metadata["publishedAt"], "2026-02-01T08:00:00Z");

    assert_eq!(records[1].name, "acme/empty");
    assert_eq!(records[1].error_kind, Some(ErrorKind::Parse));
}

#[tokio::test]
async fn test_vendor_page_without_match_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/downloads"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<ul><li>Download Tool v7.4.2 for Linux</li></ul>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maintenance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("back soon"))
        .mount(&server)
        .await;

    let pattern = r"Download Tool v(\d+(?:\.\d+)*)".to_string();
    let mut config = config_for(&server);
    config.vendors = vec![
        VendorConfig {
            name: "Tool".to_string(),
            url: format!("{}/downloads", server.uri()),
            pattern: pattern.clone(),
            installed: Some("7.4.2".to_string()),
        },
        VendorConfig {
            name: "Tool (mirror)".to_string(),
            url: format!("{}/maintenance", server.uri()),
            pattern,
            installed: Some("7.4.2".to_string()),
        },
    ];
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let records = dashboard.list_vendor_versions().await;
    assert_eq!(records[0].state, ItemState::Current);
    assert_eq!(records[0].latest_version.as_deref(), Some("7.4.2"));
    assert_eq!(records[1].state, ItemState::Error);
    assert_eq!(records[1].error_kind, Some(ErrorKind::Parse));
}

#[tokio::test]
async fn test_eol_is_filtered_by_allow_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/debian.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "cycle": "13", "eol": "2028-08-09" },
            { "cycle": "12", "eol": "2026-06-10" },
            { "cycle": "11", "eol": "2024-08-14" },
            { "cycle": "10", "eol": true }
        ])))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.eol = BTreeMap::from([(
        "debian".to_string(),
        vec!["12".to_string(), "11".to_string()],
    )]);
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let cycles = dashboard.list_eol_versions("debian").await.unwrap();
    let names: Vec<_> = cycles.iter().map(|c| c.cycle.as_str()).collect();
    assert_eq!(names, vec!["12", "11"]);
    assert_matches!(cycles[1].eol, Some(EolDate::Date(_)));
}

#[tokio::test]
async fn test_eol_failure_is_an_error_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/solaris.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let dashboard = dashboard(&config_for(&server), StubCertificates::new(None), None);

    let result = dashboard.list_eol_versions("solaris").await;
    assert_eq!(result, Err(FetchError::Upstream { status: 404 }));

    // the second request goes upstream again
    assert!(dashboard.list_eol_versions("solaris").await.is_err());
}

#[tokio::test]
async fn test_refresh_all_bypasses_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/modules/puppetlabs-apt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_release": { "version": "10.1.0" },
            "deprecated_at": null
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/debian.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.modules = vec![module("puppetlabs-apt", Some("10.1.0"))];
    config.eol = BTreeMap::from([("debian".to_string(), vec!["12".to_string()])]);
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    dashboard.list_modules().await;
    let summary = dashboard.refresh_all().await;

    assert_eq!(summary.modules, 1);
    assert_eq!(summary.platforms, 1);
    assert_eq!(summary.failed_platforms, 1);
}
