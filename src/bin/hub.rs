use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use opsboard::{
    actors::{PollJob, PollerHandle},
    api::{ApiConfig, ApiState, spawn_api_server},
    cache::FreshnessCache,
    config::{Config, read_config_file},
    dashboard::Dashboard,
    software::{FileSoftwareStore, MemorySoftwareStore, SoftwareStore},
    util::{get_addr, get_log_level, get_port, get_redis_url, get_token},
};
use tracing::{info, trace, warn};
use tracing_subscriber::{
    filter::{self, LevelFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Version, lifecycle and website status dashboard")]
struct Args {
    /// Config file, the built-in roster is used without one
    #[arg(short, long)]
    file: Option<String>,
}

/// The library and this binary log at `level`, dependencies stay quiet
fn log_filter(level: LevelFilter) -> filter::Targets {
    filter::Targets::new().with_targets(vec![("opsboard", level), (module_path!(), level)])
}

fn init() {
    dotenv::dotenv().ok();

    let filter = log_filter(get_log_level());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(file) => read_config_file(file)?,
        None => {
            info!("no config file given, using the built-in roster");
            Config::default()
        }
    };

    let cache = FreshnessCache::from_config(&config.cache, get_redis_url()).await;
    info!("caching in {}", cache.backend_name());

    let dashboard = Arc::new(Dashboard::new(&config, cache)?);
    let software = software_store(&config).await?;

    let pollers = spawn_pollers(&config, &dashboard);

    let api_config = ApiConfig {
        bind_addr: SocketAddr::from((get_addr(), get_port())),
        auth_token: get_token(),
        enable_cors: true,
    };
    if api_config.auth_token.is_none() {
        warn!("OPSBOARD_TOKEN is not set, the API is open");
    }
    spawn_api_server(api_config, ApiState::new(dashboard, software)).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutting down");

    for poller in pollers {
        poller.shutdown().await;
    }

    Ok(())
}

async fn software_store(config: &Config) -> anyhow::Result<Arc<dyn SoftwareStore>> {
    Ok(match &config.software_store {
        Some(path) => {
            let store = FileSoftwareStore::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            info!("software versions stored in {}", store.path().display());
            Arc::new(store)
        }
        None => {
            warn!("no software_store configured, software versions are kept in memory");
            Arc::new(MemorySoftwareStore::new())
        }
    })
}

fn spawn_pollers(config: &Config, dashboard: &Arc<Dashboard>) -> Vec<PollerHandle> {
    [
        (PollJob::Websites, config.poller.websites),
        (PollJob::Collections, config.poller.collections),
    ]
    .into_iter()
    .filter(|(job, secs)| {
        if *secs == 0 {
            info!("{job} poller disabled");
        }
        *secs > 0
    })
    .map(|(job, secs)| PollerHandle::spawn(dashboard.clone(), job, Duration::from_secs(secs)))
    .collect()
}
