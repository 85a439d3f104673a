//! Puppet Forge module metadata

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{FetchError, HttpSource, SourceFetcher};
use crate::StatusRecord;
use crate::config::ModuleConfig;
use crate::version::Comparison;

#[derive(Debug, Deserialize)]
struct ModuleResponse {
    current_release: Release,
    deprecated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Release {
    version: String,
}

pub struct ForgeFetcher {
    http: HttpSource,
}

impl ForgeFetcher {
    pub fn new(http: HttpSource) -> Self {
        Self { http }
    }

    /// Public Forge page of a module, `author-name` -> `author/name`
    pub fn module_page(module: &str) -> String {
        format!(
            "https://forge.puppet.com/modules/{}",
            module.replacen('-', "/", 1)
        )
    }

    async fn try_fetch(&self, module: &str) -> Result<ModuleResponse, FetchError> {
        let url = self.http.url(&format!("v3/modules/{module}"));
        self.http.get_json(&url).await
    }
}

#[async_trait]
impl SourceFetcher for ForgeFetcher {
    type Identity = ModuleConfig;
    type Output = StatusRecord;

    fn source(&self) -> &'static str {
        "forge"
    }

    #[instrument(skip(self), fields(module = %module.name))]
    async fn fetch(&self, module: &ModuleConfig) -> StatusRecord {
        let record = StatusRecord::new(&module.name)
            .installed(module.installed.as_deref())
            .meta("url", Self::module_page(&module.name));

        match self.try_fetch(&module.name).await {
            Ok(response) => {
                let deprecated = response.deprecated_at.is_some();
                let mut record = record.resolved(
                    &response.current_release.version,
                    deprecated,
                    Comparison::Strict,
                );
                if let Some(since) = response.deprecated_at {
                    record = record.meta("deprecatedAt", since);
                }
                record
            }
            Err(e) => {
                warn!("failed to fetch forge module {}: {e}", module.name);
                record.failed(&e)
            }
        }
    }
}
