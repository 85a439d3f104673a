use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

/// Cache backend configuration
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CacheConfig {
    /// Process local cache (cold-start deployments)
    #[default]
    Memory,

    /// Shared redis instance (always-on deployments)
    Redis {
        url: String,

        #[serde(default = "default_key_prefix")]
        key_prefix: String,
    },
}

fn default_key_prefix() -> String {
    "opsboard:".to_string()
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub modules: Vec<ModuleConfig>,
    pub terraform_providers: Vec<ProviderConfig>,

    /// Platform name -> allow-listed release cycles
    pub eol: BTreeMap<String, Vec<String>>,

    pub github: Vec<GitHubConfig>,
    pub vendors: Vec<VendorConfig>,
    pub websites: Vec<WebsiteConfig>,

    pub alert: Option<Alert>,

    /// Also notify when a website comes back online
    pub notify_on_recovery: bool,

    /// Upper bound in seconds on delivering a single alert
    pub alert_timeout: u64,

    pub cache: CacheConfig,
    pub ttl: TtlConfig,
    pub sources: SourceUrls,
    pub poller: PollerConfig,

    /// JSON file backing the manually maintained software list
    pub software_store: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules: default_modules(),
            terraform_providers: vec![],
            eol: default_eol_allow_lists(),
            github: vec![],
            vendors: vec![],
            websites: vec![],
            alert: None,
            notify_on_recovery: false,
            alert_timeout: 10,
            cache: CacheConfig::default(),
            ttl: TtlConfig::default(),
            sources: SourceUrls::default(),
            poller: PollerConfig::default(),
            software_store: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ModuleConfig {
    /// Forge slug, e.g. `puppetlabs-apt`
    pub name: String,
    pub installed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ProviderConfig {
    pub namespace: String,
    pub name: String,
    pub display: Option<String>,
    pub installed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct GitHubConfig {
    /// `owner/repo`
    pub repo: String,
    pub display: Option<String>,
    pub installed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct VendorConfig {
    pub name: String,
    pub url: String,
    /// Regex with one capture group around the version
    pub pattern: String,
    pub installed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct WebsiteConfig {
    pub url: String,
    pub display: Option<String>,
    #[serde(default = "default_website_timeout")]
    pub timeout: u64,
}

fn default_website_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    Discord(Discord),
    Webhook(Webhook),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Discord {
    pub url: String,
    pub user_id: Option<String>,
}

/// Freshness classes in seconds
#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
pub struct TtlConfig {
    /// Website liveness
    pub short: u64,
    /// Forge modules and Terraform providers
    pub medium: u64,
    /// Lifecycle data, GitHub releases and vendor pages
    pub long: u64,
    /// Last known website state used for change detection
    pub notifier_state: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            short: 30,
            medium: 3600,
            long: 86400,
            notifier_state: 7 * 86400,
        }
    }
}

impl TtlConfig {
    pub fn short(&self) -> Duration {
        Duration::from_secs(self.short)
    }

    pub fn medium(&self) -> Duration {
        Duration::from_secs(self.medium)
    }

    pub fn long(&self) -> Duration {
        Duration::from_secs(self.long)
    }

    pub fn notifier_state(&self) -> Duration {
        Duration::from_secs(self.notifier_state)
    }
}

/// Upstream base URLs
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct SourceUrls {
    pub forge: String,
    pub endoflife: String,
    pub terraform: String,
    pub github: String,
    /// Per-call timeout for all version sources
    pub timeout: u64,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            forge: "https://forgeapi.puppet.com".to_string(),
            endoflife: "https://endoflife.date".to_string(),
            terraform: "https://registry.terraform.io".to_string(),
            github: "https://api.github.com".to_string(),
            timeout: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Seconds between forced website checks, 0 disables the poller
    pub websites: u64,
    /// Seconds between full collection refreshes, 0 disables the poller
    pub collections: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            websites: 60,
            collections: 0,
        }
    }
}

fn default_modules() -> Vec<ModuleConfig> {
    [
        ("dsc-auditpolicydsc", Some("1.4.0-0-9")),
        ("pcfens-ca_cert", None),
        ("puppet-alternatives", Some("6.0.0")),
        ("puppet-archive", Some("7.1.0")),
        ("puppet-systemd", Some("8.2.0")),
        ("puppetlabs-apt", Some("10.0.1")),
        ("puppetlabs-facts", Some("1.7.0")),
        ("puppetlabs-inifile", Some("6.2.0")),
        ("puppetlabs-powershell", Some("6.0.2")),
        ("puppetlabs-registry", Some("5.0.3")),
        ("puppetlabs-stdlib", Some("9.7.0")),
        ("saz-sudo", Some("9.0.2")),
    ]
    .into_iter()
    .map(|(name, installed)| ModuleConfig {
        name: name.to_string(),
        installed: installed.map(str::to_string),
    })
    .collect()
}

fn default_eol_allow_lists() -> BTreeMap<String, Vec<String>> {
    let lists: [(&str, &[&str]); 3] = [
        ("debian", &["11", "12"]),
        (
            "sles",
            &["12.5", "15", "15.1", "15.2", "15.3", "15.4", "15.5", "15.6"],
        ),
        ("windows-server", &["2019", "2022"]),
    ];

    lists
        .into_iter()
        .map(|(platform, cycles)| {
            (
                platform.to_string(),
                cycles.iter().map(|c| c.to_string()).collect(),
            )
        })
        .collect()
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
