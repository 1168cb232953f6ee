//! Wire types for one page of the upstream history feed.
//!
//! The feed omits or nulls fields freely. Every collection decodes to empty,
//! every flag to `false`, and everything else to `None` when missing.

use crate::models::{CounterpartyRef, ProjectRef, TokenRef};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Treats an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryPage {
    #[serde(default, deserialize_with = "nullable")]
    pub history_list: Vec<HistoryItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub project_dict: HashMap<String, ProjectEntry>,
    #[serde(default, deserialize_with = "nullable")]
    pub token_dict: HashMap<String, TokenEntry>,
    #[serde(default, deserialize_with = "nullable")]
    pub cex_dict: HashMap<String, CexEntry>,
}

impl HistoryPage {
    pub fn projects(&self) -> impl Iterator<Item = ProjectRef> + '_ {
        self.project_dict
            .iter()
            .map(|(key, entry)| entry.clone().into_ref(key))
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenRef> + '_ {
        self.token_dict
            .iter()
            .map(|(key, entry)| entry.clone().into_ref(key))
    }

    pub fn counterparties(&self) -> impl Iterator<Item = CounterpartyRef> + '_ {
        self.cex_dict
            .iter()
            .map(|(address, entry)| entry.clone().into_ref(address))
    }

    pub fn has_reference_data(&self) -> bool {
        !(self.project_dict.is_empty() && self.token_dict.is_empty() && self.cex_dict.is_empty())
    }
}

/// One entry of `history_list`. Fields this crate does not interpret are
/// kept in `extra` so the stored payload stays complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub cate_id: Option<String>,
    #[serde(default)]
    pub time_at: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_scam: bool,
    #[serde(default)]
    pub other_addr: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub sends: Vec<TokenLeg>,
    #[serde(default, deserialize_with = "nullable")]
    pub receives: Vec<TokenLeg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_approve: Option<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub tx: TxInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryItem {
    /// Event time truncated to whole seconds.
    pub fn timestamp(&self) -> Option<i64> {
        self.time_at.filter(|t| t.is_finite()).map(|t| t as i64)
    }

    pub fn has_transfers(&self) -> bool {
        !(self.sends.is_empty() && self.receives.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenLeg {
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_addr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxInfo {
    #[serde(default)]
    pub from_addr: Option<String>,
    #[serde(default)]
    pub to_addr: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub usd_gas_fee: Option<f64>,
    #[serde(default)]
    pub eth_gas_fee: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectEntry {
    pub id: Option<String>,
    pub chain: Option<String>,
    pub logo_url: Option<String>,
    pub name: Option<String>,
    pub site_url: Option<String>,
}

impl ProjectEntry {
    /// The entry's own id wins over the dictionary key.
    pub fn into_ref(self, key: &str) -> ProjectRef {
        ProjectRef {
            id: self.id.unwrap_or_else(|| key.to_string()),
            chain: self.chain,
            name: self.name,
            logo_url: self.logo_url,
            site_url: self.site_url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenEntry {
    pub id: Option<String>,
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

impl TokenEntry {
    pub fn into_ref(self, key: &str) -> TokenRef {
        TokenRef {
            id: self.id.unwrap_or_else(|| key.to_string()),
            chain: self.chain,
            name: self.name,
            symbol: self.symbol,
            display_symbol: self.display_symbol,
            optimized_symbol: self.optimized_symbol,
            decimals: self.decimals,
            logo_url: self.logo_url,
            protocol_id: self.protocol_id,
            price: self.price,
            price_24h_change: self.price_24h_change,
            is_verified: self.is_verified,
            is_core: self.is_core,
            is_wallet: self.is_wallet,
            is_scam: self.is_scam,
            is_suspicious: self.is_suspicious,
            credit_score: self.credit_score,
            total_supply: self.total_supply,
            time_at: self.time_at,
        }
    }
}

/// `cex_dict` value. The dictionary key is the exchange-owned address and
/// `id` is the exchange's own id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CexEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub is_deposit: Option<bool>,
    pub is_collect: Option<bool>,
    pub is_gastopup: Option<bool>,
    pub is_vault: Option<bool>,
    pub is_withdraw: Option<bool>,
}

impl CexEntry {
    pub fn into_ref(self, address: &str) -> CounterpartyRef {
        CounterpartyRef {
            address: address.to_lowercase(),
            cex_id: self.id,
            name: self.name,
            logo_url: self.logo_url,
            is_deposit: self.is_deposit,
            is_collect: self.is_collect,
            is_gastopup: self.is_gastopup,
            is_vault: self.is_vault,
            is_withdraw: self.is_withdraw,
        }
    }
}
