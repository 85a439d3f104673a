//! System status rollup
//!
//! Every dimension is reduced on its own from what is currently cached. A
//! dimension without data, or whose data cannot be read, reports `unknown`
//! and never keeps the others from being computed.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{FreshnessCache, keys};
use crate::fetchers::{EolCycle, EolDate};
use crate::{ItemState, StatusRecord, WebsiteStatus};

pub const CERT_CRITICAL_DAYS: i64 = 7;
pub const CERT_WARNING_DAYS: i64 = 30;
pub const EOL_WARNING_DAYS: i64 = 365;

const NO_DATA: &str = "no data yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Info,
    Warning,
    Critical,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSummary {
    pub severity: Severity,
    pub detail: String,
}

impl DimensionSummary {
    pub fn new(severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            severity,
            detail: detail.into(),
        }
    }

    pub fn no_data() -> Self {
        Self::new(Severity::Unknown, NO_DATA)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatusDigest {
    pub modules: DimensionSummary,
    pub providers: DimensionSummary,
    pub websites: DimensionSummary,
    pub certificates: DimensionSummary,
    pub lifecycle: DimensionSummary,
    pub generated_at: DateTime<Utc>,
}

/// Freshness of a version collection.
///
/// Entries in `error` state count neither as current nor as outdated, so a
/// collection in which every fetch failed rolls up to `ok`.
pub fn summarize_versions(label: &str, records: &[StatusRecord]) -> DimensionSummary {
    let count = |state| records.iter().filter(|r| r.state == state).count();
    let deprecated = count(ItemState::Deprecated);
    let outdated = count(ItemState::Outdated);
    let failed = count(ItemState::Error);
    let checked = records.len() - failed;

    let summary = if deprecated > 0 {
        DimensionSummary::new(
            Severity::Warning,
            format!("{deprecated} deprecated, {outdated} outdated of {checked} {label}"),
        )
    } else if outdated > 0 {
        DimensionSummary::new(
            Severity::Info,
            format!("{outdated} of {checked} {label} outdated"),
        )
    } else {
        DimensionSummary::new(Severity::Ok, format!("all {checked} {label} up to date"))
    };

    if failed > 0 {
        DimensionSummary {
            detail: format!("{} ({failed} could not be checked)", summary.detail),
            ..summary
        }
    } else {
        summary
    }
}

pub fn summarize_websites(statuses: &[WebsiteStatus]) -> DimensionSummary {
    if statuses.is_empty() {
        return DimensionSummary::new(Severity::Unknown, "no websites monitored");
    }

    let total = statuses.len();
    let online = statuses.iter().filter(|s| s.is_online()).count();

    if online == total {
        DimensionSummary::new(Severity::Ok, format!("all {total} websites online"))
    } else if online > 0 {
        let offline: Vec<_> = statuses
            .iter()
            .filter(|s| !s.is_online())
            .map(|s| s.display_name.as_str())
            .collect();
        DimensionSummary::new(
            Severity::Warning,
            format!("{online} of {total} websites online, offline: {}", offline.join(", ")),
        )
    } else {
        DimensionSummary::new(Severity::Critical, format!("0 of {total} websites online"))
    }
}

/// Whole days until `expiry`, rounded up
fn days_until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (expiry - now).num_seconds();
    seconds.div_euclid(86400) + i64::from(seconds.rem_euclid(86400) != 0)
}

pub fn summarize_certificates(statuses: &[WebsiteStatus], now: DateTime<Utc>) -> DimensionSummary {
    let expiries: Vec<_> = statuses
        .iter()
        .filter_map(|s| s.certificate.as_ref().map(|c| (s, c.expiry)))
        .collect();

    if expiries.is_empty() {
        return DimensionSummary::new(Severity::Unknown, "no certificate data");
    }

    let within = |days: i64| -> Vec<String> {
        expiries
            .iter()
            .filter(|(_, expiry)| *expiry - now <= Duration::days(days))
            .map(|(s, expiry)| {
                format!("{} ({} days)", s.display_name, days_until(*expiry, now))
            })
            .collect()
    };

    let critical = within(CERT_CRITICAL_DAYS);
    if !critical.is_empty() {
        return DimensionSummary::new(
            Severity::Critical,
            format!(
                "expiring within {CERT_CRITICAL_DAYS} days: {}",
                critical.join(", ")
            ),
        );
    }

    let warning = within(CERT_WARNING_DAYS);
    if !warning.is_empty() {
        return DimensionSummary::new(
            Severity::Warning,
            format!(
                "expiring within {CERT_WARNING_DAYS} days: {}",
                warning.join(", ")
            ),
        );
    }

    DimensionSummary::new(
        Severity::Ok,
        format!("all {} certificates valid for more than {CERT_WARNING_DAYS} days", expiries.len()),
    )
}

/// Lifecycle proximity over the allow-listed cycles of every platform
pub fn summarize_lifecycle(platforms: &[(String, Vec<EolCycle>)], today: NaiveDate) -> DimensionSummary {
    let horizon = today + Duration::days(EOL_WARNING_DAYS);

    let mut ended = vec![];
    let mut ending = vec![];
    let mut tracked = 0;

    for (platform, cycles) in platforms {
        for cycle in cycles {
            tracked += 1;
            let name = format!("{platform} {}", cycle.cycle);
            match cycle.eol {
                Some(EolDate::Date(date)) if date <= today => ended.push(name),
                Some(EolDate::Date(date)) if date <= horizon => ending.push(format!("{name} ({date})")),
                Some(EolDate::Flag(true)) => ended.push(name),
                _ => {}
            }
        }
    }

    if !ended.is_empty() {
        DimensionSummary::new(
            Severity::Critical,
            format!("end of life reached: {}", ended.join(", ")),
        )
    } else if !ending.is_empty() {
        DimensionSummary::new(
            Severity::Warning,
            format!("end of life within {EOL_WARNING_DAYS} days: {}", ending.join(", ")),
        )
    } else {
        DimensionSummary::new(Severity::Ok, format!("all {tracked} release cycles supported"))
    }
}

/// Reduces the cached collections into a [`SystemStatusDigest`]
#[derive(Clone)]
pub struct StatusAggregator {
    cache: FreshnessCache,
    platforms: Vec<String>,
}

impl StatusAggregator {
    pub fn new(cache: FreshnessCache, platforms: Vec<String>) -> Self {
        Self { cache, platforms }
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, String> {
        self.cache.get(key).await.map_err(|e| {
            warn!("could not read {key} for the status digest: {e}");
            format!("could not read cached data: {e}")
        })
    }

    async fn dimension<T, F>(&self, key: &str, summarize: F) -> DimensionSummary
    where
        T: DeserializeOwned,
        F: FnOnce(T) -> DimensionSummary,
    {
        match self.load(key).await {
            Ok(Some(value)) => summarize(value),
            Ok(None) => DimensionSummary::no_data(),
            Err(detail) => DimensionSummary::new(Severity::Unknown, detail),
        }
    }

    async fn lifecycle(&self, today: NaiveDate) -> DimensionSummary {
        let mut platforms = vec![];
        let mut problems = vec![];

        for platform in &self.platforms {
            match self.load::<Vec<EolCycle>>(&keys::eol(platform)).await {
                Ok(Some(cycles)) => platforms.push((platform.clone(), cycles)),
                Ok(None) => {}
                Err(detail) => problems.push(detail),
            }
        }

        if platforms.is_empty() {
            return match problems.into_iter().next() {
                Some(detail) => DimensionSummary::new(Severity::Unknown, detail),
                None => DimensionSummary::no_data(),
            };
        }

        summarize_lifecycle(&platforms, today)
    }

    pub async fn digest(&self) -> SystemStatusDigest {
        self.digest_at(Utc::now()).await
    }

    pub async fn digest_at(&self, now: DateTime<Utc>) -> SystemStatusDigest {
        let modules = self
            .dimension(keys::MODULES, |records: Vec<StatusRecord>| {
                summarize_versions("modules", &records)
            })
            .await;
        let providers = self
            .dimension(keys::TERRAFORM_PROVIDERS, |records: Vec<StatusRecord>| {
                summarize_versions("providers", &records)
            })
            .await;
        let websites = self
            .dimension(keys::WEBSITES, |statuses: Vec<WebsiteStatus>| {
                summarize_websites(&statuses)
            })
            .await;
        let certificates = self
            .dimension(keys::WEBSITES, |statuses: Vec<WebsiteStatus>| {
                summarize_certificates(&statuses, now)
            })
            .await;
        let lifecycle = self.lifecycle(now.date_naive()).await;

        SystemStatusDigest {
            modules,
            providers,
            websites,
            certificates,
            lifecycle,
            generated_at: now,
        }
    }
}
