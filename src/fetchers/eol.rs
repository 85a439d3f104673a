//! endoflife.date lifecycle datasets
//!
//! Unlike the version sources this one yields a list per platform, filtered
//! down to the configured allow-list of release cycles. A failed fetch is
//! returned as the error itself so the caller can answer with an error
//! payload instead of a record list.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{FetchError, HttpSource, SourceFetcher};

/// End of life marker: either a date or a plain yes/no
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EolDate {
    Date(NaiveDate),
    Flag(bool),
}

/// One release cycle as reported upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EolCycle {
    #[serde(deserialize_with = "cycle_name")]
    pub cycle: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eol: Option<EolDate>,

    /// Remaining upstream fields, passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Some platforms report numeric cycles (`12` instead of `"12"`)
fn cycle_name<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected cycle value: {other}"
        ))),
    }
}

/// Platform and the cycles tracked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub name: String,
    /// `None` keeps every cycle
    pub allow_list: Option<Vec<String>>,
}

impl Platform {
    pub fn new(name: impl Into<String>, allow_list: Option<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            allow_list,
        }
    }

    fn keeps(&self, cycle: &EolCycle) -> bool {
        self.allow_list
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|c| *c == cycle.cycle))
    }
}

pub struct EolFetcher {
    http: HttpSource,
}

impl EolFetcher {
    pub fn new(http: HttpSource) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SourceFetcher for EolFetcher {
    type Identity = Platform;
    type Output = Result<Vec<EolCycle>, FetchError>;

    fn source(&self) -> &'static str {
        "endoflife"
    }

    #[instrument(skip(self), fields(platform = %platform.name))]
    async fn fetch(&self, platform: &Platform) -> Self::Output {
        let url = self.http.url(&format!("api/{}.json", platform.name));

        let cycles: Vec<EolCycle> = self.http.get_json(&url).await.inspect_err(|e| {
            warn!("failed to fetch lifecycle data for {}: {e}", platform.name);
        })?;

        let total = cycles.len();
        let kept: Vec<_> = cycles.into_iter().filter(|c| platform.keeps(c)).collect();
        debug!("kept {} of {total} cycles for {}", kept.len(), platform.name);

        Ok(kept)
    }
}
