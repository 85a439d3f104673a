//! Latest GitHub release of a repository

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{FetchError, HttpSource, SourceFetcher};
use crate::StatusRecord;
use crate::config::GitHubConfig;
use crate::version::Comparison;

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    html_url: Option<String>,
    published_at: Option<String>,
}

pub struct GitHubFetcher {
    http: HttpSource,
}

impl GitHubFetcher {
    pub fn new(http: HttpSource) -> Self {
        Self { http }
    }

    async fn try_fetch(&self, repo: &str) -> Result<Release, FetchError> {
        let url = self.http.url(&format!("repos/{repo}/releases/latest"));
        let release: Release = self.http.get_json(&url).await?;

        if release.tag_name.trim().is_empty() {
            return Err(FetchError::Parse(format!("{repo} has an empty release tag")));
        }

        Ok(release)
    }
}

#[async_trait]
impl SourceFetcher for GitHubFetcher {
    type Identity = GitHubConfig;
    type Output = StatusRecord;

    fn source(&self) -> &'static str {
        "github"
    }

    #[instrument(skip(self), fields(repo = %repo.repo))]
    async fn fetch(&self, repo: &GitHubConfig) -> StatusRecord {
        let name = repo.display.as_deref().unwrap_or(&repo.repo);
        let record = StatusRecord::new(name)
            .installed(repo.installed.as_deref())
            .meta("repository", &repo.repo);

        match self.try_fetch(&repo.repo).await {
            Ok(release) => {
                let mut record = record.resolved(&release.tag_name, false, Comparison::Loose);
                if let Some(url) = release.html_url {
                    record = record.meta("url", url);
                }
                if let Some(published) = release.published_at {
                    record = record.meta("publishedAt", published);
                }
                record
            }
            Err(e) => {
                warn!("failed to fetch latest release of {}: {e}", repo.repo);
                record.failed(&e)
            }
        }
    }
}
