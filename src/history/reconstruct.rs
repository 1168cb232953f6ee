use crate::catalog::ReferenceCatalog;
use crate::db::{EventQuery, HistoryStore, StoreError};
use crate::history::classify;
use crate::models::{Direction, RawEvent, ReadableTransaction};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Parameters of one readable history request.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub owners: Vec<String>,
    pub skip: usize,
    pub limit: usize,
    pub chain: Option<String>,
    pub include_scam: bool,
    pub min_value_usd: f64,
}

impl HistoryRequest {
    pub fn new(owners: Vec<String>) -> Self {
        Self {
            owners,
            skip: 0,
            limit: 50,
            chain: None,
            include_scam: false,
            min_value_usd: 0.01,
        }
    }
}

/// Builds deduplicated, enriched history from stored events.
pub struct HistoryReader {
    store: Arc<dyn HistoryStore>,
    catalog: Arc<ReferenceCatalog>,
}

impl HistoryReader {
    pub fn new(store: Arc<dyn HistoryStore>, catalog: Arc<ReferenceCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Returns the `skip..skip + limit` window of logical transactions, newest
    /// first. Pagination counts transactions, not stored rows.
    pub async fn readable_history(&self, request: &HistoryRequest) -> Result<Vec<ReadableTransaction>, StoreError> {
        let mut owners: Vec<String> = request.owners.iter().map(|o| o.trim().to_lowercase()).collect();
        owners.sort();
        owners.dedup();
        owners.retain(|o| !o.is_empty());

        if owners.is_empty() || request.limit == 0 {
            return Ok(Vec::new());
        }

        let owner_set: HashSet<String> = owners.iter().cloned().collect();
        let query = EventQuery {
            owners,
            chain: request.chain.clone(),
            include_scam: request.include_scam,
        };

        let wanted = request.skip.saturating_add(request.limit);
        // Over-fetch: rows dropped by filters or merged into a group do not
        // count towards the window.
        let chunk_size = i64::try_from(request.limit.saturating_mul(2)).unwrap_or(i64::MAX);
        let mut groups = GroupAccumulator::default();
        let mut offset = 0_i64;

        while groups.len() < wanted {
            let chunk = self.store.fetch_events(&query, offset, chunk_size).await?;
            if chunk.is_empty() {
                break;
            }
            offset += chunk.len() as i64;

            for candidate in self.build_candidates(&chunk, request.min_value_usd).await? {
                groups.push(candidate);
            }
        }

        debug!(
            "Assembled {} transaction groups from {} stored rows",
            groups.len(),
            offset
        );

        let mut records = groups.into_canonical(&owner_set);
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(records
            .into_iter()
            .skip(request.skip)
            .take(request.limit)
            .collect())
    }

    /// Enriches one chunk of rows, dropping approvals and rows below the value
    /// threshold. Catalog lookups are batched per chunk.
    async fn build_candidates(
        &self,
        chunk: &[RawEvent],
        min_value_usd: f64,
    ) -> Result<Vec<ReadableTransaction>, StoreError> {
        let rows: Vec<(&RawEvent, Direction, Option<String>)> = chunk
            .iter()
            .filter(|event| !classify::is_approval_only(&event.payload))
            .map(|event| {
                let direction = classify::direction(&event.payload, &event.address);
                let other = classify::other_address(&event.payload, direction);
                (event, direction, other)
            })
            .collect();

        let mut token_ids = HashSet::new();
        let mut project_ids = HashSet::new();
        let mut other_addrs = HashSet::new();
        for (event, _, other) in &rows {
            let legs = event.payload.sends.iter().chain(event.payload.receives.iter());
            token_ids.extend(legs.filter_map(|leg| leg.token_id.clone()));
            project_ids.extend(event.payload.project_id.clone());
            other_addrs.extend(other.clone());
        }

        let tokens = self.catalog.resolve_tokens(&into_vec(token_ids)).await?;
        let projects = self.catalog.resolve_projects(&into_vec(project_ids)).await?;
        let exchanges = self.catalog.resolve_counterparties(&into_vec(other_addrs)).await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for (event, direction, other_addr) in rows {
            let item = &event.payload;

            let token_changes = classify::token_changes(item, &tokens);
            if classify::total_value_usd(&token_changes) < min_value_usd {
                continue;
            }

            let counterparty = classify::counterparty(
                item.project_id.as_deref(),
                other_addr.as_deref(),
                &projects,
                &exchanges,
            );

            let mut candidate = ReadableTransaction {
                tx_hash: event.id.clone(),
                chain: event.chain.clone(),
                timestamp: event.time_at,
                date_time: classify::format_timestamp(event.time_at),
                cate_id: event.cate_id.clone(),
                tx_name: item.tx.name.clone(),
                kind: classify::kind(item),
                direction,
                counterparty,
                other_addr,
                wallet_addr: event.address.clone(),
                token_changes,
                usd_gas_fee: item.tx.usd_gas_fee,
                eth_gas_fee: item.tx.eth_gas_fee,
                is_scam: event.is_scam,
                description: String::new(),
            };
            candidate.description = classify::describe(&candidate);
            candidates.push(candidate);
        }

        Ok(candidates)
    }
}

/// Candidates bucketed by `(id, chain)` in first-seen order.
#[derive(Default)]
struct GroupAccumulator {
    index: HashMap<(String, String), usize>,
    groups: Vec<Vec<ReadableTransaction>>,
}

impl GroupAccumulator {
    fn push(&mut self, candidate: ReadableTransaction) {
        let key = (candidate.tx_hash.clone(), candidate.chain.clone());
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].push(candidate),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push(vec![candidate]);
            }
        }
    }

    fn len(&self) -> usize {
        self.groups.len()
    }

    fn into_canonical(self, owners: &HashSet<String>) -> Vec<ReadableTransaction> {
        self.groups
            .into_iter()
            .filter_map(|group| classify::canonicalize(group, owners))
            .collect()
    }
}

fn into_vec(ids: HashSet<String>) -> Vec<String> {
    ids.into_iter().filter(|id| !id.is_empty()).collect()
}
