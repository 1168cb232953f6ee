// Per-row interpretation of a stored event: token legs, direction,
// counterparty, kind label and the one-line description, plus the choice of a
// single record for a group of rows describing the same transaction.

use crate::feed::models::HistoryItem;
use crate::models::{
    Counterparty, CounterpartyRef, CounterpartySource, Direction, ProjectRef, ReadableTransaction,
    TokenAmount, TokenRef,
};
use chrono::DateTime;
use std::collections::{HashMap, HashSet};

pub const UNKNOWN_SYMBOL: &str = "???";
pub const UNKNOWN_NAME: &str = "Unknown";

pub const KIND_SWAP: &str = "Swap";
pub const KIND_SEND: &str = "Send";
pub const KIND_RECEIVE: &str = "Receive";
pub const KIND_SELF_TRANSFER: &str = "Self Transfer";
pub const KIND_INTERACTION: &str = "Interaction";

/// Approvals move no value and are not shown.
pub fn is_approval_only(item: &HistoryItem) -> bool {
    !item.has_transfers()
        && (item.token_approve.is_some() || item.cate_id.as_deref() == Some("approve"))
}

pub fn token_amount(token_id: &str, amount: f64, tokens: &HashMap<String, TokenRef>) -> TokenAmount {
    let (symbol, name, logo_url, price) = match tokens.get(token_id) {
        Some(token) => {
            let symbol = token.best_symbol().unwrap_or(UNKNOWN_SYMBOL).to_string();
            let name = token
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| symbol.clone());
            (symbol, name, token.logo_url.clone(), token.price.unwrap_or(0.0))
        }
        None => (UNKNOWN_SYMBOL.to_string(), UNKNOWN_NAME.to_string(), None, 0.0),
    };

    TokenAmount {
        token_id: token_id.to_string(),
        symbol,
        name,
        logo_url,
        amount,
        amount_raw: amount.abs(),
        price,
        value_usd: amount * price,
    }
}

/// Sent legs first with negative amounts, then received legs.
pub fn token_changes(item: &HistoryItem, tokens: &HashMap<String, TokenRef>) -> Vec<TokenAmount> {
    let sent = item
        .sends
        .iter()
        .map(|leg| token_amount(leg.token_id.as_deref().unwrap_or_default(), -leg.amount.abs(), tokens));
    let received = item
        .receives
        .iter()
        .map(|leg| token_amount(leg.token_id.as_deref().unwrap_or_default(), leg.amount.abs(), tokens));

    sent.chain(received).collect()
}

pub fn total_value_usd(changes: &[TokenAmount]) -> f64 {
    changes.iter().map(|change| change.value_usd.abs()).sum()
}

/// Whether `owner` initiated or received the value. Rows with both kinds of
/// leg or none at all fall back to the receiver side only when something was
/// received.
pub fn direction(item: &HistoryItem, owner: &str) -> Direction {
    let has_sends = !item.sends.is_empty();
    let has_receives = !item.receives.is_empty();

    if eq_address(item.tx.from_addr.as_deref(), owner) || (has_sends && !has_receives) {
        Direction::Sender
    } else if has_receives {
        Direction::Receiver
    } else {
        Direction::Sender
    }
}

/// The address on the other side: explicit `other_addr`, else the side of the
/// transaction the owner is not on.
pub fn other_address(item: &HistoryItem, direction: Direction) -> Option<String> {
    let fallback = match direction {
        Direction::Sender => item.tx.to_addr.as_deref(),
        Direction::Receiver => item.tx.from_addr.as_deref(),
    };

    item.other_addr
        .as_deref()
        .filter(|addr| !addr.is_empty())
        .or(fallback)
        .filter(|addr| !addr.is_empty())
        .map(str::to_lowercase)
}

pub fn counterparty(
    project_id: Option<&str>,
    other_addr: Option<&str>,
    projects: &HashMap<String, ProjectRef>,
    exchanges: &HashMap<String, CounterpartyRef>,
) -> Counterparty {
    if let Some(project) = project_id.and_then(|id| projects.get(id)) {
        return Counterparty {
            source: CounterpartySource::Project,
            id: Some(project.id.clone()),
            name: project.name.clone().unwrap_or_default(),
            logo_url: project.logo_url.clone(),
        };
    }

    if let Some(exchange) = other_addr.and_then(|addr| exchanges.get(&addr.to_lowercase())) {
        return Counterparty {
            source: CounterpartySource::Exchange,
            id: exchange.cex_id.clone(),
            name: exchange.name.clone().unwrap_or_default(),
            logo_url: exchange.logo_url.clone(),
        };
    }

    Counterparty::unresolved()
}

pub fn kind(item: &HistoryItem) -> String {
    match (item.sends.is_empty(), item.receives.is_empty()) {
        (false, false) => KIND_SWAP.to_string(),
        (false, true) => KIND_SEND.to_string(),
        (true, false) => KIND_RECEIVE.to_string(),
        (true, true) => item
            .tx
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| KIND_INTERACTION.to_string()),
    }
}

/// UTC `YYYY-MM-DD HH:MM:SS`, empty without a timestamp.
pub fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn describe(tx: &ReadableTransaction) -> String {
    let sent = list_legs(tx.token_changes.iter().filter(|c| c.amount < 0.0));
    let received = list_legs(tx.token_changes.iter().filter(|c| c.amount >= 0.0));
    let party = party_label(tx);

    match tx.kind.as_str() {
        KIND_SWAP => match party {
            Some(party) => format!("Swap {} for {} via {}", sent, received, party),
            None => format!("Swap {} for {}", sent, received),
        },
        KIND_SEND => format!("Send {} to {}", sent, party.as_deref().unwrap_or("unknown")),
        KIND_RECEIVE => format!("Receive {} from {}", received, party.as_deref().unwrap_or("unknown")),
        KIND_SELF_TRANSFER => format!("Move {} between own wallets", sent),
        other => match party {
            Some(party) => format!("{} with {}", other, party),
            None => other.to_string(),
        },
    }
}

/// Picks the one record shown for a group of rows sharing `(id, chain)`.
///
/// The sender's row usually carries the network fee, so it wins; when its
/// counterparty is another requested wallet the transfer is internal. Without
/// a sender row the first row with a fee wins, else the first row.
pub fn canonicalize(mut group: Vec<ReadableTransaction>, owners: &HashSet<String>) -> Option<ReadableTransaction> {
    if group.len() <= 1 {
        return group.pop();
    }

    if let Some(index) = group.iter().position(|c| c.direction == Direction::Sender) {
        let mut selected = group.swap_remove(index);
        let internal = selected
            .other_addr
            .as_deref()
            .is_some_and(|addr| owners.contains(&addr.to_lowercase()));
        if internal {
            selected.kind = KIND_SELF_TRANSFER.to_string();
            selected.description = describe(&selected);
        }
        return Some(selected);
    }

    let index = group
        .iter()
        .position(|c| c.usd_gas_fee.is_some_and(|fee| fee > 0.0))
        .unwrap_or(0);
    Some(group.swap_remove(index))
}

fn party_label(tx: &ReadableTransaction) -> Option<String> {
    if !tx.counterparty.name.is_empty() {
        return Some(tx.counterparty.name.clone());
    }
    tx.other_addr.as_deref().map(short_address)
}

fn list_legs<'a>(legs: impl Iterator<Item = &'a TokenAmount>) -> String {
    let parts: Vec<String> = legs
        .map(|leg| format!("{} {}", format_amount(leg.amount_raw), leg.symbol))
        .collect();
    if parts.is_empty() {
        "nothing".to_string()
    } else {
        parts.join(", ")
    }
}

fn format_amount(amount: f64) -> String {
    let text = format!("{:.6}", amount);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() { "0".to_string() } else { text.to_string() }
}

/// `0xabcd…7890` for long addresses, anything else unchanged.
pub fn short_address(address: &str) -> String {
    if address.len() > 12 && address.is_ascii() {
        format!("{}…{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

fn eq_address(candidate: Option<&str>, owner: &str) -> bool {
    candidate.is_some_and(|addr| !addr.is_empty() && addr.eq_ignore_ascii_case(owner))
}
