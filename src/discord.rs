use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::alerts::{AlertError, AlertKind, WebsiteAlert};
use crate::config::Discord;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Default)]
pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

const RED: u32 = 15158332;
const GREEN: u32 = 3066993;

#[derive(Debug, Clone)]
pub struct DiscordManager {
    client: Client,
}

impl DiscordManager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn build_website_embed(&self, alert: &WebsiteAlert) -> Embed {
        let (title, description, color) = match alert.kind {
            AlertKind::Down => (
                "🔴 Website Offline",
                format!("**{}** stopped answering", alert.display_name),
                RED,
            ),
            AlertKind::Recovered => (
                "✅ Website Recovered",
                format!("**{}** is back online", alert.display_name),
                GREEN,
            ),
        };

        let mut fields = vec![EmbedField {
            name: "🌐 URL".to_string(),
            value: alert.url.clone(),
            inline: false,
        }];
        if let Some(detail) = &alert.detail {
            fields.push(EmbedField {
                name: "⚠️ Error".to_string(),
                value: detail.clone(),
                inline: false,
            });
        }

        Embed {
            title: Some(title.to_string()),
            description: Some(description),
            color: Some(color),
            fields,
            footer: Some(EmbedFooter {
                text: format!("Website: {}", alert.display_name),
            }),
            timestamp: Some(alert.at.to_rfc3339()),
        }
    }

    pub fn build_message(&self, discord: &Discord, alert: &WebsiteAlert) -> Message {
        let mut message_builder = MessageBuilder::new().add_embed(self.build_website_embed(alert));
        if let Some(user_id) = &discord.user_id {
            let emoji = match alert.kind {
                AlertKind::Down => "🔴",
                AlertKind::Recovered => "✅",
            };
            message_builder =
                message_builder.content(format!("{emoji} `{}` <@{user_id}>", alert.display_name));
        }
        message_builder.build()
    }

    #[instrument(skip(self, discord, message))]
    pub async fn send_message(&self, discord: &Discord, message: &Message) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&discord.url)
            .json(message)
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        if response.status().is_success() {
            info!("Successfully sent Discord message");
            return Ok(());
        }

        let status = response.status();
        error!("Discord message failed with status: {}", status);
        if let Ok(error_text) = response.text().await {
            error!("Discord API error response: {}", error_text);
        }
        Err(AlertError::Rejected {
            status: status.as_u16(),
        })
    }
}
