// Stored rows (raw events, reference catalog records), derived readable
// transactions and sync results.

use crate::feed::models::HistoryItem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One ledger entry as seen from one owned address.
///
/// Unique by `(id, chain, address)` and never updated once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub chain: String,
    pub address: String,
    pub cate_id: Option<String>,
    pub time_at: Option<i64>,
    pub is_scam: bool,
    pub payload: HistoryItem,
}

impl RawEvent {
    /// Builds the stored row for `owner`. Returns `None` when the upstream item
    /// has no id or no chain.
    pub fn from_item(owner: &str, item: &HistoryItem) -> Option<Self> {
        let id = item.id.as_deref().filter(|id| !id.is_empty())?;
        let chain = item.chain.as_deref().filter(|chain| !chain.is_empty())?;

        Some(Self {
            id: id.to_string(),
            chain: chain.to_string(),
            address: owner.to_lowercase(),
            cate_id: item.cate_id.clone(),
            time_at: item.timestamp(),
            is_scam: item.is_scam,
            payload: item.clone(),
        })
    }

    pub fn key(&self) -> EventKey<'_> {
        EventKey {
            id: &self.id,
            chain: &self.chain,
            address: &self.address,
        }
    }
}

/// Composite identity of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKey<'a> {
    pub id: &'a str,
    pub chain: &'a str,
    pub address: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub chain: Option<String>,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRef {
    pub id: String,
    pub chain: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub display_symbol: Option<String>,
    pub optimized_symbol: Option<String>,
    pub decimals: Option<i64>,
    pub logo_url: Option<String>,
    pub protocol_id: Option<String>,
    pub price: Option<f64>,
    pub price_24h_change: Option<f64>,
    pub is_verified: Option<bool>,
    pub is_core: Option<bool>,
    pub is_wallet: Option<bool>,
    pub is_scam: Option<bool>,
    pub is_suspicious: Option<bool>,
    pub credit_score: Option<f64>,
    pub total_supply: Option<f64>,
    pub time_at: Option<f64>,
}

impl TokenRef {
    /// Most readable symbol available, in upstream preference order.
    pub fn best_symbol(&self) -> Option<&str> {
        [&self.optimized_symbol, &self.display_symbol, &self.symbol]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|symbol| !symbol.is_empty())
    }
}

/// Exchange-owned address (deposit, withdrawal, vault, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyRef {
    pub address: String,
    pub cex_id: Option<String>,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub is_deposit: Option<bool>,
    pub is_collect: Option<bool>,
    pub is_gastopup: Option<bool>,
    pub is_vault: Option<bool>,
    pub is_withdraw: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Project,
    Token,
    Counterparty,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Project => "project",
            CatalogKind::Token => "token",
            CatalogKind::Counterparty => "counterparty",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference catalog row of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogRecord {
    Project(ProjectRef),
    Token(TokenRef),
    Counterparty(CounterpartyRef),
}

impl CatalogRecord {
    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogRecord::Project(_) => CatalogKind::Project,
            CatalogRecord::Token(_) => CatalogKind::Token,
            CatalogRecord::Counterparty(_) => CatalogKind::Counterparty,
        }
    }

    /// Natural key: project id, token id or lower-cased counterparty address.
    pub fn id(&self) -> &str {
        match self {
            CatalogRecord::Project(project) => &project.id,
            CatalogRecord::Token(token) => &token.id,
            CatalogRecord::Counterparty(counterparty) => &counterparty.address,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sender,
    Receiver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartySource {
    Project,
    Exchange,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub source: CounterpartySource,
    pub id: Option<String>,
    pub name: String,
    pub logo_url: Option<String>,
}

impl Counterparty {
    pub fn unresolved() -> Self {
        Self {
            source: CounterpartySource::Unresolved,
            id: None,
            name: String::new(),
            logo_url: None,
        }
    }
}

/// One token leg with resolved metadata. Sent legs carry a negative amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token_id: String,
    pub symbol: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub amount: f64,
    pub amount_raw: f64,
    pub price: f64,
    pub value_usd: f64,
}

/// One logical transaction after grouping, computed per read request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadableTransaction {
    pub tx_hash: String,
    pub chain: String,
    pub timestamp: Option<i64>,
    pub date_time: String,
    pub cate_id: Option<String>,
    pub tx_name: Option<String>,
    pub kind: String,
    pub direction: Direction,
    pub counterparty: Counterparty,
    pub other_addr: Option<String>,
    pub wallet_addr: String,
    pub token_changes: Vec<TokenAmount>,
    pub usd_gas_fee: Option<f64>,
    pub eth_gas_fee: Option<f64>,
    pub is_scam: bool,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    PartialError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSyncResult {
    pub address: String,
    pub status: SyncStatus,
    pub synced_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// API response models
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub results: Vec<AddressSyncResult>,
}
