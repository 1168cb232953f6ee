//! Shared fixtures: in-memory store, scripted feed and history item builders.

use crate::cache;
use crate::catalog::ReferenceCatalog;
use crate::config::Config;
use crate::db::{connection, HistoryStore, SqliteStore};
use crate::feed::models::HistoryItem;
use crate::feed::{FeedError, HistoryFeed, HistoryPage};
use crate::history::HistoryReader;
use crate::models::{CatalogRecord, RawEvent, TokenRef};
use crate::sync::SyncDriver;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const WALLET_A: &str = "0x1111111111111111111111111111111111111111";
pub const WALLET_B: &str = "0x2222222222222222222222222222222222222222";
pub const STRANGER: &str = "0x9999999999999999999999999999999999999999";
pub const EXCHANGE: &str = "0x5555555555555555555555555555555555555555";
pub const CONTRACT: &str = "0x7777777777777777777777777777777777777777";

enum Scripted {
    Page(Value),
    Status(u16),
}

/// Feed serving pre-registered responses keyed by `(address, start_time)`.
/// Unscripted requests get an empty page.
#[derive(Default)]
pub struct FakeFeed {
    script: Mutex<HashMap<(String, Option<i64>), Scripted>>,
    calls: Mutex<Vec<(String, Option<i64>)>>,
}

impl FakeFeed {
    pub fn page(&self, address: &str, start_time: Option<i64>, body: Value) {
        self.script
            .lock()
            .unwrap()
            .insert((address.to_string(), start_time), Scripted::Page(body));
    }

    pub fn fail(&self, address: &str, start_time: Option<i64>, status: u16) {
        self.script
            .lock()
            .unwrap()
            .insert((address.to_string(), start_time), Scripted::Status(status));
    }

    pub fn calls(&self) -> Vec<(String, Option<i64>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryFeed for FakeFeed {
    async fn fetch_page(&self, address: &str, start_time: Option<i64>) -> Result<HistoryPage, FeedError> {
        self.calls.lock().unwrap().push((address.to_string(), start_time));

        let script = self.script.lock().unwrap();
        match script.get(&(address.to_string(), start_time)) {
            Some(Scripted::Page(body)) => {
                Ok(serde_json::from_value(body.clone()).expect("scripted page must decode"))
            }
            Some(Scripted::Status(code)) => Err(FeedError::Status {
                status: StatusCode::from_u16(*code).unwrap(),
                body: "upstream unavailable".to_string(),
            }),
            None => Ok(HistoryPage::default()),
        }
    }
}

pub struct Harness {
    pub store: Arc<SqliteStore>,
    pub catalog: Arc<ReferenceCatalog>,
    pub feed: Arc<FakeFeed>,
    pub driver: Arc<SyncDriver>,
    pub reader: HistoryReader,
    pub shutdown: CancellationToken,
}

pub async fn setup() -> Harness {
    let pool = connection::establish_in_memory()
        .await
        .expect("Failed to open in-memory database");
    let store = Arc::new(SqliteStore::new(pool));
    let dyn_store: Arc<dyn HistoryStore> = store.clone();

    let catalog = Arc::new(ReferenceCatalog::new(
        dyn_store.clone(),
        cache::build_cache(1_000, Duration::from_secs(60)),
    ));
    let feed = Arc::new(FakeFeed::default());
    let shutdown = CancellationToken::new();
    let driver = Arc::new(SyncDriver::new(
        feed.clone(),
        dyn_store.clone(),
        catalog.clone(),
        4,
        shutdown.clone(),
    ));
    let reader = HistoryReader::new(dyn_store, catalog.clone());

    Harness {
        store,
        catalog,
        feed,
        driver,
        reader,
        shutdown,
    }
}

impl Harness {
    /// Stores `item` as seen from `owner`, bypassing the sync driver.
    pub async fn insert(&self, owner: &str, item: Value) {
        let item: HistoryItem = serde_json::from_value(item).unwrap();
        let event = RawEvent::from_item(owner, &item).expect("fixture needs id and chain");
        self.store.insert_event_if_absent(&event).await.unwrap();
    }

    pub async fn token(&self, id: &str, symbol: &str, price: f64) {
        self.catalog
            .upsert(CatalogRecord::Token(TokenRef {
                id: id.to_string(),
                symbol: Some(symbol.to_string()),
                name: Some(format!("{} token", symbol)),
                price: Some(price),
                ..Default::default()
            }))
            .await
            .unwrap();
    }

    pub async fn stored_events(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM address_history")
            .fetch_one(self.store.pool())
            .await
            .unwrap()
    }
}

/// Contract interaction with no token legs.
pub fn interaction(id: &str, chain: &str, time_at: Option<i64>) -> Value {
    json!({
        "id": id,
        "chain": chain,
        "cate_id": null,
        "time_at": time_at,
        "is_scam": false,
        "sends": [],
        "receives": [],
        "tx": {
            "from_addr": STRANGER,
            "to_addr": CONTRACT,
            "name": "execute",
            "usd_gas_fee": 0.0,
            "eth_gas_fee": 0.0
        }
    })
}

/// `owner` sends `amount` of `token` to `to`, paying gas.
pub fn send(id: &str, time_at: i64, owner: &str, to: &str, token: &str, amount: f64) -> Value {
    json!({
        "id": id,
        "chain": "eth",
        "cate_id": "send",
        "time_at": time_at,
        "is_scam": false,
        "other_addr": to,
        "sends": [{ "token_id": token, "amount": amount, "to_addr": to }],
        "receives": [],
        "tx": {
            "from_addr": owner,
            "to_addr": to,
            "name": "transfer",
            "usd_gas_fee": 1.25,
            "eth_gas_fee": 0.0005
        }
    })
}

/// `owner` receives `amount` of `token` from `from`.
pub fn receive(id: &str, time_at: i64, owner: &str, from: &str, token: &str, amount: f64) -> Value {
    json!({
        "id": id,
        "chain": "eth",
        "cate_id": "receive",
        "time_at": time_at,
        "is_scam": false,
        "other_addr": from,
        "sends": [],
        "receives": [{ "token_id": token, "amount": amount, "from_addr": from }],
        "tx": {
            "from_addr": from,
            "to_addr": owner,
            "name": "transfer",
            "usd_gas_fee": 0.0,
            "eth_gas_fee": 0.0
        }
    })
}

pub fn history_page(items: Vec<Value>) -> Value {
    json!({
        "history_list": items,
        "project_dict": {},
        "token_dict": {},
        "cex_dict": {}
    })
}

pub fn test_config(feed_url: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        feed_url: feed_url.to_string(),
        feed_access_key: Some("test-access-key".to_string()),
        feed_timeout: Duration::from_secs(5),
        feed_rate_limit: None,
        sync_concurrency: 2,
        sync_interval: Duration::from_secs(3600),
        sync_on_startup: false,
        catalog_cache_ttl: Duration::from_secs(60),
        catalog_cache_max_capacity: 1_000,
        tracked_addresses: Vec::new(),
    }
}
