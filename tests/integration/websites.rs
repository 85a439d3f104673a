//! Website monitoring end to end
//!
//! These tests verify that:
//! - Liveness and certificates are checked per website
//! - A slow website times out without delaying the verdict on others
//! - The digest rolls websites and certificates up separately
//! - Alerts fire on the transition to offline only
//! - A webhook that never answers does not hold up the check

use std::sync::Arc;
use std::time::Duration;

use opsboard::aggregator::Severity;
use opsboard::alerts::{AlertKind, AlertManager, AlertSink};
use opsboard::cache::FreshnessCache;
use opsboard::config::{Alert, Webhook};
use opsboard::dashboard::Dashboard;
use opsboard::{LivenessState, WebsiteStatus};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{
    RecordingSink, StubCertificates, certificate_expiring_in, config_for, dashboard, website,
};

fn by_name<'a>(statuses: &'a [WebsiteStatus], name: &str) -> &'a WebsiteStatus {
    statuses.iter().find(|s| s.display_name == name).unwrap()
}

#[tokio::test]
async fn test_online_and_timed_out_website() {
    let healthy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&healthy)
        .await;

    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&slow)
        .await;

    let mut config = config_for(&healthy);
    config.websites = vec![
        website(format!("{}/", healthy.uri()), "Status", 1),
        website(format!("{}/", slow.uri()), "Portal", 1),
    ];
    let certificates = StubCertificates::new(Some(certificate_expiring_in(10)));
    let dashboard = dashboard(&config, certificates.clone(), None);

    let statuses = dashboard.check_websites(true).await;
    assert_eq!(statuses.len(), 2);

    let status = by_name(&statuses, "Status");
    assert_eq!(status.status, LivenessState::Online);
    assert_eq!(status.http_status, Some(200));
    assert!(status.certificate.is_some());

    let portal = by_name(&statuses, "Portal");
    assert_eq!(portal.status, LivenessState::Offline);
    assert!(portal.error.is_some());
    assert!(portal.certificate.is_none());

    // only the online website was inspected
    assert_eq!(certificates.calls(), 1);

    let digest = dashboard.system_status().await;
    assert_eq!(digest.websites.severity, Severity::Warning);
    assert!(digest.websites.detail.contains("Portal"));
    assert_eq!(digest.certificates.severity, Severity::Warning);
    assert!(digest.certificates.detail.contains("Status (10 days)"));
}

#[tokio::test]
async fn test_redirect_is_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/elsewhere"))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.websites = vec![website(format!("{}/", server.uri()), "Moved", 2)];
    let certificates = StubCertificates::new(Some(certificate_expiring_in(90)));
    let dashboard = dashboard(&config, certificates.clone(), None);

    let statuses = dashboard.check_websites(true).await;
    assert_eq!(statuses[0].status, LivenessState::Offline);
    assert_eq!(statuses[0].http_status, Some(301));
    assert_eq!(certificates.calls(), 0);

    let digest = dashboard.system_status().await;
    assert_eq!(digest.websites.severity, Severity::Critical);
    assert_eq!(digest.certificates.severity, Severity::Unknown);
}

#[tokio::test]
async fn test_unforced_check_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.websites = vec![website(format!("{}/", server.uri()), "Status", 2)];
    let dashboard = dashboard(&config, StubCertificates::new(None), None);

    let fresh = dashboard.check_websites(false).await;
    let cached = dashboard.check_websites(false).await;

    assert_eq!(fresh, cached);
    assert_eq!(dashboard.registry().snapshot().await.as_slice(), fresh.as_slice());
}

#[tokio::test]
async fn test_alert_fires_once_when_website_goes_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.websites = vec![website(format!("{}/", server.uri()), "Status", 2)];
    let sink = RecordingSink::new();
    let dashboard = dashboard(&config, StubCertificates::new(None), Some(sink.clone()));

    // the first observation is only a baseline
    dashboard.check_websites(true).await;
    assert!(sink.alerts().is_empty());

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    dashboard.check_websites(true).await;
    dashboard.check_websites(true).await;

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Down);
    assert_eq!(alerts[0].display_name, "Status");
    assert!(alerts[0].detail.as_deref().unwrap_or_default().contains("503"));
}

#[tokio::test]
async fn test_recovery_alert_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.websites = vec![website(format!("{}/", server.uri()), "Status", 2)];
    config.notify_on_recovery = true;
    let sink = RecordingSink::new();
    let dashboard = dashboard(&config, StubCertificates::new(None), Some(sink.clone()));

    dashboard.check_websites(true).await;

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    dashboard.check_websites(true).await;

    let kinds: Vec<_> = sink.alerts().iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AlertKind::Recovered]);
}

#[tokio::test]
async fn test_unanswered_webhook_does_not_stall_check() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&site)
        .await;

    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(600)))
        .mount(&hook)
        .await;

    let mut config = config_for(&site);
    config.websites = vec![website(format!("{}/", site.uri()), "Status", 1)];
    config.alert_timeout = 1;

    // client without its own timeout, only the notifier bounds delivery
    let sink = AlertManager::new(
        Alert::Webhook(Webhook {
            url: format!("{}/hook", hook.uri()),
        }),
        reqwest::Client::new(),
    );
    let dashboard = Dashboard::with_parts(
        &config,
        FreshnessCache::memory(),
        StubCertificates::new(None),
        Some(Arc::new(sink) as Arc<dyn AlertSink>),
    )
    .unwrap();

    let statuses = dashboard.check_websites(true).await;
    assert_eq!(statuses[0].status, LivenessState::Online);

    site.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;

    let statuses = tokio::time::timeout(Duration::from_secs(20), dashboard.check_websites(true))
        .await
        .expect("website check stalled on the alert webhook");
    assert_eq!(statuses[0].status, LivenessState::Offline);
    assert_eq!(statuses[0].http_status, Some(503));
}
