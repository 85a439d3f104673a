//! Helper functions for integration tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use opsboard::CertificateInfo;
use opsboard::alerts::{AlertError, AlertSink, WebsiteAlert};
use opsboard::cache::FreshnessCache;
use opsboard::certificate::CertificateSource;
use opsboard::config::{Config, PollerConfig, SourceUrls, WebsiteConfig};
use opsboard::dashboard::Dashboard;
use url::Url;
use wiremock::MockServer;

/// Config with an empty roster and every source pointing at `server`
pub fn config_for(server: &MockServer) -> Config {
    Config {
        modules: Vec::new(),
        eol: BTreeMap::new(),
        sources: SourceUrls {
            forge: server.uri(),
            endoflife: server.uri(),
            terraform: server.uri(),
            github: server.uri(),
            timeout: 2,
        },
        poller: PollerConfig {
            websites: 0,
            collections: 0,
        },
        ..Config::default()
    }
}

pub fn website(url: String, display: &str, timeout: u64) -> WebsiteConfig {
    WebsiteConfig {
        url,
        display: Some(display.to_string()),
        timeout,
    }
}

pub fn dashboard(
    config: &Config,
    certificates: Arc<StubCertificates>,
    sink: Option<Arc<RecordingSink>>,
) -> Dashboard {
    Dashboard::with_parts(
        config,
        FreshnessCache::memory(),
        certificates,
        sink.map(|s| s as Arc<dyn AlertSink>),
    )
    .unwrap()
}

pub fn certificate_expiring_in(days: i64) -> CertificateInfo {
    let now = Utc::now();
    CertificateInfo {
        expiry: now + chrono::Duration::days(days),
        valid_from: now - chrono::Duration::days(80),
        issuer_name: "Test CA".to_string(),
        subject_name: "status.example.test".to_string(),
    }
}

/// Certificate source that answers without a handshake, also for plain http
pub struct StubCertificates {
    info: Option<CertificateInfo>,
    calls: AtomicUsize,
}

impl StubCertificates {
    pub fn new(info: Option<CertificateInfo>) -> Arc<Self> {
        Arc::new(Self {
            info,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateSource for StubCertificates {
    async fn inspect(&self, _host: &str, _port: u16, _timeout: Duration) -> Option<CertificateInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.info.clone()
    }

    fn applies_to(&self, _url: &Url) -> bool {
        true
    }
}

#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<WebsiteAlert>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn alerts(&self) -> Vec<WebsiteAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, alert: &WebsiteAlert) -> Result<(), AlertError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
