//! Website liveness and certificate
//!
//! Only an exact HTTP 200 counts as online, redirects are not followed.
//! The certificate is read in a separate handshake and only for websites
//! that answered; a failed inspection leaves the certificate unknown and
//! never changes the liveness.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, redirect};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::{FetchError, SourceFetcher};
use crate::certificate::CertificateSource;
use crate::notifier::ChangeTriggeredNotifier;
use crate::registry::WebsiteTarget;
use crate::{LivenessState, WebsiteStatus};

pub struct WebsiteFetcher {
    client: Client,
    certificates: Arc<dyn CertificateSource>,
    notifier: Option<Arc<ChangeTriggeredNotifier>>,
}

impl WebsiteFetcher {
    pub fn new(certificates: Arc<dyn CertificateSource>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(concat!("opsboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            certificates,
            notifier: None,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<ChangeTriggeredNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    async fn probe(&self, target: &WebsiteTarget, status: &mut WebsiteStatus) {
        let started = Instant::now();
        let response = self
            .client
            .get(target.url.clone())
            .timeout(target.timeout)
            .send()
            .await;
        status.response_time_ms = Some(started.elapsed().as_millis() as u64);

        match response {
            Ok(response) if response.status() == StatusCode::OK => {
                status.http_status = Some(response.status().as_u16());
                status.status = LivenessState::Online;
            }
            Ok(response) => {
                let code = response.status().as_u16();
                status.http_status = Some(code);
                status.status = LivenessState::Offline;
                status.error = Some(FetchError::Upstream { status: code }.to_string());
            }
            Err(e) => {
                status.status = LivenessState::Offline;
                status.error = Some(FetchError::from(e).to_string());
            }
        }
    }
}

#[async_trait]
impl SourceFetcher for WebsiteFetcher {
    type Identity = WebsiteTarget;
    type Output = WebsiteStatus;

    fn source(&self) -> &'static str {
        "website"
    }

    #[instrument(skip(self, target), fields(url = %target.url))]
    async fn fetch(&self, target: &WebsiteTarget) -> WebsiteStatus {
        let mut status = WebsiteStatus::unchecked(&target.url, &target.display_name);
        status.last_checked = Some(Utc::now());

        self.probe(target, &mut status).await;

        if status.is_online() && self.certificates.applies_to(&target.url) {
            if let Some(host) = target.host() {
                status.certificate = self
                    .certificates
                    .inspect(host, target.port(), target.timeout)
                    .await;
            }
        }

        match &status.error {
            Some(error) => warn!("{} is offline: {error}", target.display_name),
            None => debug!("{} is online", target.display_name),
        }

        if let Some(notifier) = &self.notifier {
            notifier.on_check_result(&status).await;
        }

        status
    }
}
