use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::config::{Alert, Webhook};
use crate::discord::DiscordManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// A website went offline
    Down,
    /// A website came back online
    Recovered,
}

/// One outbound notification about a monitored website
#[derive(Debug, Clone, PartialEq)]
pub struct WebsiteAlert {
    pub display_name: String,
    pub url: String,
    pub kind: AlertKind,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl WebsiteAlert {
    /// Plain text rendering used by generic webhooks
    pub fn message(&self) -> String {
        match (self.kind, &self.detail) {
            (AlertKind::Down, Some(err)) => format!(
                "🔴 **Website DOWN**: `{}` is offline ({})\nURL: {}",
                self.display_name, err, self.url
            ),
            (AlertKind::Down, None) => format!(
                "🔴 **Website DOWN**: `{}` is offline\nURL: {}",
                self.display_name, self.url
            ),
            (AlertKind::Recovered, _) => format!(
                "✅ **Website Recovered**: `{}` is back online\nURL: {}",
                self.display_name, self.url
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlertError {
    #[error("failed to deliver alert: {0}")]
    Transport(String),

    #[error("alert rejected with HTTP {status}")]
    Rejected { status: u16 },
}

/// Where notifications go
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, alert: &WebsiteAlert) -> Result<(), AlertError>;
}

#[derive(Debug, Clone)]
pub struct AlertManager {
    client: Client,
    config: Alert,
    discord_manager: DiscordManager,
}

impl AlertManager {
    pub fn new(config: Alert, client: Client) -> Self {
        Self {
            discord_manager: DiscordManager::new(client.clone()),
            client,
            config,
        }
    }

    #[instrument(skip(self, webhook, alert))]
    async fn send_webhook_alert(
        &self,
        webhook: &Webhook,
        alert: &WebsiteAlert,
    ) -> Result<(), AlertError> {
        let payload = json!({
            "message": alert.message(),
            "website": alert.display_name,
            "url": alert.url,
            "status": match alert.kind {
                AlertKind::Down => "down",
                AlertKind::Recovered => "up",
            },
            "error": alert.detail,
            "timestamp": alert.at.to_rfc3339()
        });

        let response = self
            .client
            .post(&webhook.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        if response.status().is_success() {
            info!("Successfully sent webhook alert");
            Ok(())
        } else {
            error!("Webhook alert failed with status: {}", response.status());
            Err(AlertError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }
}

#[async_trait]
impl AlertSink for AlertManager {
    async fn send(&self, alert: &WebsiteAlert) -> Result<(), AlertError> {
        match &self.config {
            Alert::Discord(discord) => {
                let message = self.discord_manager.build_message(discord, alert);
                self.discord_manager.send_message(discord, &message).await
            }
            Alert::Webhook(webhook) => self.send_webhook_alert(webhook, alert).await,
        }
    }
}
