//! Request driven entry points of the aggregator
//!
//! Every collection is served from the freshness cache while it is fresh
//! and collected again through the [`ParallelCollector`] otherwise. Failing
//! cache reads degrade to a fresh collection, failing cache writes only cost
//! the next request a collection of its own.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::aggregator::{StatusAggregator, SystemStatusDigest};
use crate::alerts::{AlertManager, AlertSink};
use crate::cache::{FreshnessCache, HealthStatus, keys};
use crate::certificate::{CertificateSource, TlsInspector};
use crate::collector::ParallelCollector;
use crate::config::{Config, GitHubConfig, ModuleConfig, ProviderConfig, TtlConfig};
use crate::fetchers::eol::Platform;
use crate::fetchers::vendor::VendorPage;
use crate::fetchers::{
    EolCycle, EolFetcher, FetchError, ForgeFetcher, GitHubFetcher, HttpSource, SourceFetcher,
    TerraformFetcher, VendorFetcher, WebsiteFetcher,
};
use crate::notifier::ChangeTriggeredNotifier;
use crate::registry::WebsiteRegistry;
use crate::{StatusRecord, WebsiteStatus};

/// Item counts of one full refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub modules: usize,
    pub providers: usize,
    pub releases: usize,
    pub vendors: usize,
    pub websites: usize,
    pub platforms: usize,
    pub failed_platforms: usize,
}

impl RefreshSummary {
    pub fn total(&self) -> usize {
        self.modules + self.providers + self.releases + self.vendors + self.websites + self.platforms
    }
}

pub struct Dashboard {
    modules: Vec<ModuleConfig>,
    providers: Vec<ProviderConfig>,
    platforms: BTreeMap<String, Vec<String>>,
    repositories: Vec<GitHubConfig>,
    vendor_pages: Vec<VendorPage>,

    cache: FreshnessCache,
    ttl: TtlConfig,
    collector: ParallelCollector,
    registry: Arc<WebsiteRegistry>,
    aggregator: StatusAggregator,

    forge: ForgeFetcher,
    eol: EolFetcher,
    terraform: TerraformFetcher,
    github: GitHubFetcher,
    vendor: VendorFetcher,
    website: WebsiteFetcher,
}

impl Dashboard {
    /// Dashboard with real TLS inspection and the configured alert transport
    pub fn new(config: &Config, cache: FreshnessCache) -> anyhow::Result<Self> {
        let certificates = Arc::new(TlsInspector::new().context("failed to set up TLS inspection")?);
        let sink = match config.alert.clone() {
            Some(alert) => {
                let client = http_client_builder()
                    .timeout(Duration::from_secs(config.alert_timeout))
                    .build()
                    .context("failed to build alert client")?;
                Some(Arc::new(AlertManager::new(alert, client)) as Arc<dyn AlertSink>)
            }
            None => None,
        };

        Self::with_parts(config, cache, certificates, sink)
    }

    /// Dashboard with explicit certificate source and alert sink
    pub fn with_parts(
        config: &Config,
        cache: FreshnessCache,
        certificates: Arc<dyn CertificateSource>,
        sink: Option<Arc<dyn AlertSink>>,
    ) -> anyhow::Result<Self> {
        let client = http_client()?;
        let timeout = Duration::from_secs(config.sources.timeout);
        let source = |base_url: &str| HttpSource::new(client.clone(), base_url, timeout);

        let vendor_pages = config
            .vendors
            .iter()
            .map(|vendor| {
                VendorPage::try_from(vendor)
                    .with_context(|| format!("invalid version pattern for vendor {}", vendor.name))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let notifier = ChangeTriggeredNotifier::new(cache.clone(), sink, config.ttl.notifier_state())
            .with_recovery_notifications(config.notify_on_recovery)
            .with_alert_timeout(Duration::from_secs(config.alert_timeout));
        let website = WebsiteFetcher::new(certificates)
            .context("failed to build website client")?
            .with_notifier(Arc::new(notifier));

        let platforms = config.eol.clone();
        let aggregator = StatusAggregator::new(cache.clone(), platforms.keys().cloned().collect());

        Ok(Self {
            modules: config.modules.clone(),
            providers: config.terraform_providers.clone(),
            platforms,
            repositories: config.github.clone(),
            vendor_pages,
            cache,
            ttl: config.ttl,
            collector: ParallelCollector::default(),
            registry: Arc::new(WebsiteRegistry::from_config(&config.websites)),
            aggregator,
            forge: ForgeFetcher::new(source(&config.sources.forge)),
            eol: EolFetcher::new(source(&config.sources.endoflife)),
            terraform: TerraformFetcher::new(source(&config.sources.terraform)),
            github: GitHubFetcher::new(source(&config.sources.github)),
            vendor: VendorFetcher::new(client.clone(), timeout),
            website,
        })
    }

    pub fn registry(&self) -> Arc<WebsiteRegistry> {
        self.registry.clone()
    }

    pub fn cache(&self) -> &FreshnessCache {
        &self.cache
    }

    /// Serve `key` from the cache unless forced, collect and store otherwise
    async fn cached_or_collect<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        force: bool,
        collect: F,
    ) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !force {
            match self.cache.get(key).await {
                Ok(Some(cached)) => {
                    debug!("serving {key} from cache");
                    return cached;
                }
                Ok(None) => debug!("no cached {key}"),
                Err(e) => warn!("could not read {key} from cache, collecting: {e}"),
            }
        }

        let fresh = collect().await;
        if let Err(e) = self.cache.set(key, &fresh, ttl).await {
            warn!("could not cache {key}: {e}");
        }
        fresh
    }

    async fn collect_records<F>(
        &self,
        key: &str,
        ttl: Duration,
        force: bool,
        fetcher: &F,
        roster: &[F::Identity],
    ) -> Vec<StatusRecord>
    where
        F: SourceFetcher<Output = StatusRecord>,
    {
        self.cached_or_collect(key, ttl, force, || self.collector.collect(fetcher, roster))
            .await
    }

    async fn modules(&self, force: bool) -> Vec<StatusRecord> {
        self.collect_records(keys::MODULES, self.ttl.medium(), force, &self.forge, &self.modules)
            .await
    }

    async fn terraform_providers(&self, force: bool) -> Vec<StatusRecord> {
        self.collect_records(
            keys::TERRAFORM_PROVIDERS,
            self.ttl.medium(),
            force,
            &self.terraform,
            &self.providers,
        )
        .await
    }

    async fn github_releases(&self, force: bool) -> Vec<StatusRecord> {
        self.collect_records(
            keys::GITHUB_RELEASES,
            self.ttl.long(),
            force,
            &self.github,
            &self.repositories,
        )
        .await
    }

    async fn vendor_versions(&self, force: bool) -> Vec<StatusRecord> {
        self.collect_records(
            keys::VENDOR_VERSIONS,
            self.ttl.long(),
            force,
            &self.vendor,
            &self.vendor_pages,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn eol_versions(&self, platform: &str, force: bool) -> Result<Vec<EolCycle>, FetchError> {
        let key = keys::eol(platform);

        if !force {
            match self.cache.get(&key).await {
                Ok(Some(cached)) => return Ok(cached),
                Ok(None) => {}
                Err(e) => warn!("could not read {key} from cache, collecting: {e}"),
            }
        }

        // platforms without an allow-list pass through unfiltered
        let identity = Platform::new(platform, self.platforms.get(platform).cloned());
        let cycles = self.eol.fetch(&identity).await?;

        // failures are not cached, the next request retries
        if let Err(e) = self.cache.set(&key, &cycles, self.ttl.long()).await {
            warn!("could not cache {key}: {e}");
        }
        Ok(cycles)
    }

    pub async fn list_modules(&self) -> Vec<StatusRecord> {
        self.modules(false).await
    }

    pub async fn list_terraform_providers(&self) -> Vec<StatusRecord> {
        self.terraform_providers(false).await
    }

    pub async fn list_github_releases(&self) -> Vec<StatusRecord> {
        self.github_releases(false).await
    }

    pub async fn list_vendor_versions(&self) -> Vec<StatusRecord> {
        self.vendor_versions(false).await
    }

    pub async fn list_eol_versions(&self, platform: &str) -> Result<Vec<EolCycle>, FetchError> {
        self.eol_versions(platform, false).await
    }

    /// Liveness and certificates of every monitored website.
    ///
    /// `force` skips the cache and checks every website before answering.
    #[instrument(skip(self))]
    pub async fn check_websites(&self, force: bool) -> Vec<WebsiteStatus> {
        if !force {
            match self.cache.get::<Vec<WebsiteStatus>>(keys::WEBSITES).await {
                Ok(Some(cached)) => return cached,
                Ok(None) => {}
                Err(e) => {
                    warn!("could not read websites from cache: {e}");
                    let snapshot = self.registry.snapshot().await;
                    if snapshot.iter().any(|s| s.last_checked.is_some()) {
                        return snapshot.to_vec();
                    }
                }
            }
        }

        let statuses = self
            .collector
            .collect(&self.website, self.registry.targets())
            .await;

        self.registry.publish(statuses.clone()).await;
        if let Err(e) = self.cache.set(keys::WEBSITES, &statuses, self.ttl.short()).await {
            warn!("could not cache websites: {e}");
        }

        statuses
    }

    pub async fn system_status(&self) -> SystemStatusDigest {
        self.aggregator.digest().await
    }

    /// Collect every source again, bypassing the cache
    #[instrument(skip(self))]
    pub async fn refresh_all(&self) -> RefreshSummary {
        let eol = futures::future::join_all(
            self.platforms
                .keys()
                .map(|platform| self.eol_versions(platform, true)),
        );

        let (modules, providers, releases, vendors, websites, eol) = tokio::join!(
            self.modules(true),
            self.terraform_providers(true),
            self.github_releases(true),
            self.vendor_versions(true),
            self.check_websites(true),
            eol,
        );

        let summary = RefreshSummary {
            modules: modules.len(),
            providers: providers.len(),
            releases: releases.len(),
            vendors: vendors.len(),
            websites: websites.len(),
            platforms: eol.len(),
            failed_platforms: eol.iter().filter(|r| r.is_err()).count(),
        };
        info!("refreshed all collections: {summary:?}");
        summary
    }

    pub async fn health(&self) -> HealthStatus {
        match self.cache.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus {
                healthy: false,
                message: e.to_string(),
            },
        }
    }
}

fn http_client_builder() -> ClientBuilder {
    Client::builder().user_agent(concat!("opsboard/", env!("CARGO_PKG_VERSION")))
}

fn http_client() -> anyhow::Result<Client> {
    http_client_builder()
        .build()
        .context("failed to build HTTP client")
}
