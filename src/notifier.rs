//! Edge triggered website alerts
//!
//! The last known liveness of every website lives in the freshness cache
//! under `website_state:<url>`. An alert fires only when a website goes from
//! a known non-offline state to offline.
//!
//! The first observation of a website only records a baseline and never
//! alerts, whatever its state. A website that is already offline when the
//! process starts therefore stays silent until it has been seen online once.
//!
//! Recoveries are recorded silently unless recovery notifications are
//! enabled. Delivery failures are logged and otherwise ignored, and a
//! delivery that does not finish within the alert timeout counts as failed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::alerts::{AlertKind, AlertSink, WebsiteAlert};
use crate::cache::{FreshnessCache, keys};
use crate::{LivenessState, WebsiteStatus};

/// What a check result meant for a website
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No previous state was known
    Baseline,
    Unchanged,
    WentDown,
    Recovered,
}

pub struct ChangeTriggeredNotifier {
    cache: FreshnessCache,
    sink: Option<Arc<dyn AlertSink>>,
    state_ttl: Duration,
    notify_recovery: bool,
    alert_timeout: Duration,
}

pub const ALERT_TIMEOUT: Duration = Duration::from_secs(10);

impl ChangeTriggeredNotifier {
    pub fn new(cache: FreshnessCache, sink: Option<Arc<dyn AlertSink>>, state_ttl: Duration) -> Self {
        Self {
            cache,
            sink,
            state_ttl,
            notify_recovery: false,
            alert_timeout: ALERT_TIMEOUT,
        }
    }

    pub fn with_alert_timeout(mut self, timeout: Duration) -> Self {
        self.alert_timeout = timeout;
        self
    }

    pub fn with_recovery_notifications(mut self, enabled: bool) -> Self {
        self.notify_recovery = enabled;
        self
    }

    async fn previous_state(&self, key: &str) -> Option<LivenessState> {
        match self.cache.get(key).await {
            Ok(state) => state,
            Err(e) => {
                warn!("could not read last state from {key}: {e}");
                None
            }
        }
    }

    #[instrument(skip(self, status), fields(url = %status.url))]
    pub async fn on_check_result(&self, status: &WebsiteStatus) -> Transition {
        let current = status.status;
        if current == LivenessState::Unknown {
            return Transition::Unchanged;
        }

        let key = keys::website_state(&status.url);
        let previous = self.previous_state(&key).await;

        if let Err(e) = self.cache.set(&key, &current, self.state_ttl).await {
            warn!("could not record state of {}: {e}", status.url);
        }

        let transition = match (previous, current) {
            (None, _) => Transition::Baseline,
            (Some(LivenessState::Offline), LivenessState::Offline) => Transition::Unchanged,
            (Some(_), LivenessState::Offline) => Transition::WentDown,
            (Some(LivenessState::Offline), LivenessState::Online) => Transition::Recovered,
            (Some(_), _) => Transition::Unchanged,
        };

        match transition {
            Transition::WentDown => self.notify(status, AlertKind::Down).await,
            Transition::Recovered if self.notify_recovery => {
                self.notify(status, AlertKind::Recovered).await
            }
            Transition::Recovered => info!("{} is back online", status.display_name),
            _ => {}
        }

        transition
    }

    async fn notify(&self, status: &WebsiteStatus, kind: AlertKind) {
        let Some(sink) = &self.sink else {
            info!("{} changed to {}, no alert configured", status.display_name, status.status);
            return;
        };

        let alert = WebsiteAlert {
            display_name: status.display_name.clone(),
            url: status.url.clone(),
            kind,
            detail: status.error.clone(),
            at: status.last_checked.unwrap_or_else(Utc::now),
        };

        match tokio::time::timeout(self.alert_timeout, sink.send(&alert)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("failed to notify about {}: {e}", status.url),
            Err(_) => error!(
                "failed to notify about {}: no answer within {:?}",
                status.url, self.alert_timeout
            ),
        }
    }
}
