use std::net::Ipv4Addr;

use tracing::level_filters::LevelFilter;

const OPSBOARD_PORT: &str = "OPSBOARD_PORT";

const DEFAULT_PORT: u16 = 8000;

pub fn get_default_port() -> u16 {
    DEFAULT_PORT
}

pub fn get_port() -> u16 {
    let port_from_env = std::env::var(OPSBOARD_PORT);
    port_from_env.map_or(DEFAULT_PORT, |res| res.parse().unwrap_or(DEFAULT_PORT))
}

const OPSBOARD_ADDR: &str = "OPSBOARD_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> Ipv4Addr {
    let addr_from_env = std::env::var(OPSBOARD_ADDR);
    addr_from_env.map_or(DEFAULT_ADDR, |res| res.parse().unwrap_or(DEFAULT_ADDR))
}

const OPSBOARD_TOKEN: &str = "OPSBOARD_TOKEN";

/// Bearer token required on every API request
pub fn get_token() -> Option<String> {
    std::env::var(OPSBOARD_TOKEN).ok().filter(|t| !t.is_empty())
}

const REDIS_URL: &str = "REDIS_URL";

/// Redis URL overriding the configured cache backend
pub fn get_redis_url() -> Option<String> {
    std::env::var(REDIS_URL).ok().filter(|u| !u.is_empty())
}

const OPSBOARD_LOG: &str = "OPSBOARD_LOG";

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::DEBUG;

/// Log level of the crate targets, e.g. `info` or `trace`
pub fn get_log_level() -> LevelFilter {
    let level_from_env = std::env::var(OPSBOARD_LOG);
    level_from_env.map_or(DEFAULT_LOG_LEVEL, |res| {
        res.parse().unwrap_or(DEFAULT_LOG_LEVEL)
    })
}
