// Configuration for:
// - Database connection string
// - Server listening address/port
// - Upstream history feed endpoint, access key, timeout and rate limit
// - Sync scheduling (interval, concurrency, tracked addresses)
// - Reference catalog cache settings (size, TTL)

use dotenv::dotenv;
use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_FEED_URL: &str = "https://pro-openapi.debank.com/v1/user/all_history_list";

/// Shortest accepted scheduled sync period.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Prefix of the environment variables listing addresses for the scheduled sync.
pub const TRACKED_ADDRESS_PREFIX: &str = "TRACKED_ADDRESS_";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub feed_url: String,
    pub feed_access_key: Option<String>,
    pub feed_timeout: Duration,
    pub feed_rate_limit: Option<u32>,
    pub sync_concurrency: usize,
    pub sync_interval: Duration,
    pub sync_on_startup: bool,
    pub catalog_cache_ttl: Duration,
    pub catalog_cache_max_capacity: u64,
    pub tracked_addresses: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:history.db".to_string());
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8111".to_string())
            .parse()
            .unwrap_or(8111);
        let feed_url = env::var("FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());
        let feed_access_key = env::var("FEED_ACCESS_KEY").ok().filter(|key| !key.is_empty());
        let feed_timeout = env::var("FEED_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));
        let feed_rate_limit = env::var("FEED_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);
        let sync_concurrency = env::var("SYNC_CONCURRENCY")
            .map(|v| v.parse().unwrap_or_else(|_| num_cpus::get()))
            .unwrap_or_else(|_| num_cpus::get())
            .max(1);
        let sync_interval = sync_interval_from(env::var("SYNC_INTERVAL_SECS").ok().as_deref());
        let sync_on_startup = env::var("SYNC_ON_STARTUP")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let catalog_cache_ttl = env::var("CATALOG_CACHE_TTL")
            .unwrap_or_else(|_| "600".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(600));
        let catalog_cache_max_capacity = env::var("CATALOG_CACHE_MAX_CAPACITY")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .unwrap_or(10000);

        Self {
            database_url,
            server_host,
            server_port,
            feed_url,
            feed_access_key,
            feed_timeout,
            feed_rate_limit,
            sync_concurrency,
            sync_interval,
            sync_on_startup,
            catalog_cache_ttl,
            catalog_cache_max_capacity,
            tracked_addresses: tracked_addresses_from(env::vars()),
        }
    }
}

/// Parses `SYNC_INTERVAL_SECS`, defaulting to a day and never below
/// [`MIN_SYNC_INTERVAL`].
pub fn sync_interval_from(raw: Option<&str>) -> Duration {
    let interval = raw
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(86400));

    if interval < MIN_SYNC_INTERVAL {
        warn!(
            "SYNC_INTERVAL_SECS={:?} is below the minimum, using {:?}",
            raw, MIN_SYNC_INTERVAL
        );
        return MIN_SYNC_INTERVAL;
    }
    interval
}

/// Collects the values of every `TRACKED_ADDRESS_*` variable, sorted by key so
/// runs are deterministic.
pub fn tracked_addresses_from(vars: impl Iterator<Item = (String, String)>) -> Vec<String> {
    let mut entries: Vec<(String, String)> = vars
        .filter(|(key, value)| key.starts_with(TRACKED_ADDRESS_PREFIX) && !value.trim().is_empty())
        .collect();
    entries.sort();
    entries.into_iter().map(|(_, value)| value.trim().to_lowercase()).collect()
}
