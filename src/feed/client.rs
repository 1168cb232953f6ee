use crate::config::Config;
use crate::feed::models::HistoryPage;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use std::num::NonZeroU32;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API Error {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Sync cancelled")]
    Cancelled,
}

/// Source of history pages, newest first.
///
/// `start_time` is the cursor: when set, only events strictly older than it
/// are returned.
#[async_trait]
pub trait HistoryFeed: Send + Sync {
    async fn fetch_page(&self, address: &str, start_time: Option<i64>) -> Result<HistoryPage, FeedError>;
}

pub struct DebankClient {
    http: Client,
    base_url: String,
    access_key: Option<String>,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl DebankClient {
    pub fn new(config: &Config) -> Result<Self, FeedError> {
        info!(
            "Initializing history feed client with endpoint: {}, timeout: {:?}",
            config.feed_url, config.feed_timeout
        );

        // The client timeout bounds every page fetch, including the body read.
        let http = Client::builder().timeout(config.feed_timeout).build()?;

        let limiter = config
            .feed_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            http,
            base_url: config.feed_url.clone(),
            access_key: config.feed_access_key.clone(),
            limiter,
        })
    }
}

#[async_trait]
impl HistoryFeed for DebankClient {
    async fn fetch_page(&self, address: &str, start_time: Option<i64>) -> Result<HistoryPage, FeedError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let mut query: Vec<(&str, String)> = vec![("id", address.to_string())];
        if let Some(cursor) = start_time {
            query.push(("start_time", cursor.to_string()));
        }

        let mut request = self.http.get(&self.base_url).query(&query);
        if let Some(key) = &self.access_key {
            request = request.header("AccessKey", key);
        }

        debug!("Fetching history page for {} (start_time: {:?})", address, start_time);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FeedError::Decode(e.to_string()))
    }
}
