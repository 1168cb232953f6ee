pub mod keys;

use moka::future::Cache;
use crate::{config::Config, models::CatalogRecord};

pub use keys::CatalogKey;

pub type CatalogCache = Cache<CatalogKey, CatalogRecord>;

pub fn init_cache(config: &Config) -> CatalogCache {
    build_cache(config.catalog_cache_max_capacity, config.catalog_cache_ttl)
}

pub fn build_cache(capacity: u64, ttl: std::time::Duration) -> CatalogCache {
    Cache::builder()
        .time_to_live(ttl)
        .max_capacity(capacity)
        .build()
}
