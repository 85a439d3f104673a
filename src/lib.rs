pub mod actors;
pub mod aggregator;
pub mod alerts;
pub mod api;
pub mod cache;
pub mod certificate;
pub mod collector;
pub mod config;
pub mod dashboard;
pub mod discord;
pub mod fetchers;
pub mod notifier;
pub mod registry;
pub mod software;
pub mod util;
pub mod version;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder the front end shows for versions that could not be determined.
pub const NOT_AVAILABLE: &str = "N/A";

/// State of a single monitored item after one fetch.
///
/// The variants are mutually exclusive. `Error` wins over everything else,
/// `Deprecated` wins over the version comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Current,
    Outdated,
    Deprecated,
    Unknown,
    Error,
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ItemState::Current => "current",
            ItemState::Outdated => "outdated",
            ItemState::Deprecated => "deprecated",
            ItemState::Unknown => "unknown",
            ItemState::Error => "error",
        })
    }
}

/// Why a fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The per-call deadline elapsed
    Timeout,
    /// Connection refused, DNS failure, TLS failure, ...
    Transport,
    /// Upstream answered with a non-success status code
    Upstream,
    /// Payload could not be decoded or the expected pattern was missing
    Parse,
}

/// Uniform output of every version-tracking source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// Module name, provider name, repository or tool name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,

    /// Serialized as `"N/A"` when unknown
    #[serde(default, with = "not_available")]
    pub latest_version: Option<String>,

    pub state: ItemState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    pub checked_at: DateTime<Utc>,

    /// Source specific extras (URL, namespace, display name, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl StatusRecord {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            installed_version: None,
            latest_version: None,
            state: ItemState::Unknown,
            detail: None,
            error_kind: None,
            checked_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn installed(mut self, version: Option<&str>) -> Self {
        self.installed_version = version.map(str::to_string);
        self
    }

    pub fn meta(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    /// Mark the record as failed. The latest version becomes unknown.
    pub fn failed(mut self, error: &fetchers::FetchError) -> Self {
        self.state = ItemState::Error;
        self.latest_version = None;
        self.detail = Some(error.to_string());
        self.error_kind = Some(error.kind());
        self
    }

    /// Record the upstream version and derive the state from it.
    pub fn resolved(mut self, latest: &str, deprecated: bool, comparison: version::Comparison) -> Self {
        self.latest_version = Some(latest.to_string());
        self.state = version::classify(
            self.installed_version.as_deref(),
            latest,
            deprecated,
            comparison,
        );
        self
    }

    pub fn is_error(&self) -> bool {
        self.state == ItemState::Error
    }
}

mod not_available {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::NOT_AVAILABLE;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(NOT_AVAILABLE))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|v| v != NOT_AVAILABLE))
    }
}

/// Liveness of a monitored website
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LivenessState {
    Online,
    Offline,
    /// Never checked
    Unknown,
}

impl std::fmt::Display for LivenessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LivenessState::Online => "Online",
            LivenessState::Offline => "Offline",
            LivenessState::Unknown => "Unknown",
        })
    }
}

/// Fields captured from the peer certificate of one TLS handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    pub expiry: DateTime<Utc>,
    pub valid_from: DateTime<Utc>,
    pub issuer_name: String,
    pub subject_name: String,
}

/// Snapshot of a monitored website after a check cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteStatus {
    pub url: String,
    pub display_name: String,
    pub status: LivenessState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateInfo>,
}

impl WebsiteStatus {
    /// Status of a target that has not been checked yet
    pub fn unchecked(url: impl ToString, display_name: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            display_name: display_name.to_string(),
            status: LivenessState::Unknown,
            last_checked: None,
            http_status: None,
            response_time_ms: None,
            error: None,
            certificate: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == LivenessState::Online
    }
}
