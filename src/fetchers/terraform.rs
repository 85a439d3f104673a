//! Terraform Registry provider metadata

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{FetchError, HttpSource, SourceFetcher};
use crate::StatusRecord;
use crate::config::ProviderConfig;
use crate::version::Comparison;

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    version: String,
}

pub struct TerraformFetcher {
    http: HttpSource,
}

impl TerraformFetcher {
    pub fn new(http: HttpSource) -> Self {
        Self { http }
    }

    async fn try_fetch(&self, provider: &ProviderConfig) -> Result<String, FetchError> {
        let url = self
            .http
            .url(&format!("v1/providers/{}/{}", provider.namespace, provider.name));
        let response: ProviderResponse = self.http.get_json(&url).await?;
        Ok(response.version)
    }
}

#[async_trait]
impl SourceFetcher for TerraformFetcher {
    type Identity = ProviderConfig;
    type Output = StatusRecord;

    fn source(&self) -> &'static str {
        "terraform"
    }

    #[instrument(skip(self), fields(provider = %provider.name))]
    async fn fetch(&self, provider: &ProviderConfig) -> StatusRecord {
        let record = StatusRecord::new(&provider.name)
            .installed(provider.installed.as_deref())
            .meta("namespace", &provider.namespace)
            .meta(
                "displayName",
                provider.display.as_deref().unwrap_or(&provider.name),
            )
            .meta(
                "url",
                format!(
                    "https://registry.terraform.io/providers/{}/{}/latest",
                    provider.namespace, provider.name
                ),
            );

        match self.try_fetch(provider).await {
            Ok(latest) => record.resolved(&latest, false, Comparison::Loose),
            Err(e) => {
                warn!(
                    "failed to fetch terraform provider {}/{}: {e}",
                    provider.namespace, provider.name
                );
                record.failed(&e)
            }
        }
    }
}
