// Reference catalog tables: project_dict, token_dict, cex_dict.
// Upserts overwrite the full field set; lookups are batched by key.

use crate::db::StoreError;
use crate::models::{CounterpartyRef, ProjectRef, TokenRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

// SQLite caps bound parameters per statement; stay well below the limit.
const LOOKUP_CHUNK: usize = 500;

pub async fn upsert_project(pool: &Pool<Sqlite>, project: &ProjectRef) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO project_dict (id, chain, name, logo_url, site_url)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            chain = excluded.chain,
            name = excluded.name,
            logo_url = excluded.logo_url,
            site_url = excluded.site_url
        "#,
    )
    .bind(&project.id)
    .bind(&project.chain)
    .bind(&project.name)
    .bind(&project.logo_url)
    .bind(&project.site_url)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn upsert_token(pool: &Pool<Sqlite>, token: &TokenRef) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO token_dict (
            id, chain, name, symbol, display_symbol, optimized_symbol, decimals, logo_url,
            protocol_id, price, price_24h_change, is_verified, is_core, is_wallet, is_scam,
            is_suspicious, credit_score, total_supply, time_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            chain = excluded.chain,
            name = excluded.name,
            symbol = excluded.symbol,
            display_symbol = excluded.display_symbol,
            optimized_symbol = excluded.optimized_symbol,
            decimals = excluded.decimals,
            logo_url = excluded.logo_url,
            protocol_id = excluded.protocol_id,
            price = excluded.price,
            price_24h_change = excluded.price_24h_change,
            is_verified = excluded.is_verified,
            is_core = excluded.is_core,
            is_wallet = excluded.is_wallet,
            is_scam = excluded.is_scam,
            is_suspicious = excluded.is_suspicious,
            credit_score = excluded.credit_score,
            total_supply = excluded.total_supply,
            time_at = excluded.time_at
        "#,
    )
    .bind(&token.id)
    .bind(&token.chain)
    .bind(&token.name)
    .bind(&token.symbol)
    .bind(&token.display_symbol)
    .bind(&token.optimized_symbol)
    .bind(token.decimals)
    .bind(&token.logo_url)
    .bind(&token.protocol_id)
    .bind(token.price)
    .bind(token.price_24h_change)
    .bind(token.is_verified)
    .bind(token.is_core)
    .bind(token.is_wallet)
    .bind(token.is_scam)
    .bind(token.is_suspicious)
    .bind(token.credit_score)
    .bind(token.total_supply)
    .bind(token.time_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn upsert_counterparty(pool: &Pool<Sqlite>, counterparty: &CounterpartyRef) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO cex_dict (
            address, cex_id, name, logo_url, is_deposit, is_collect, is_gastopup, is_vault, is_withdraw
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(address) DO UPDATE SET
            cex_id = excluded.cex_id,
            name = excluded.name,
            logo_url = excluded.logo_url,
            is_deposit = excluded.is_deposit,
            is_collect = excluded.is_collect,
            is_gastopup = excluded.is_gastopup,
            is_vault = excluded.is_vault,
            is_withdraw = excluded.is_withdraw
        "#,
    )
    .bind(counterparty.address.to_lowercase())
    .bind(&counterparty.cex_id)
    .bind(&counterparty.name)
    .bind(&counterparty.logo_url)
    .bind(counterparty.is_deposit)
    .bind(counterparty.is_collect)
    .bind(counterparty.is_gastopup)
    .bind(counterparty.is_vault)
    .bind(counterparty.is_withdraw)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_projects(pool: &Pool<Sqlite>, ids: &[String]) -> Result<Vec<ProjectRef>, StoreError> {
    let rows = select_by_keys(
        pool,
        "SELECT id, chain, name, logo_url, site_url FROM project_dict WHERE id IN (",
        ids,
    )
    .await?;

    rows.iter()
        .map(|row| {
            Ok(ProjectRef {
                id: row.try_get("id")?,
                chain: row.try_get("chain")?,
                name: row.try_get("name")?,
                logo_url: row.try_get("logo_url")?,
                site_url: row.try_get("site_url")?,
            })
        })
        .collect()
}

pub async fn get_tokens(pool: &Pool<Sqlite>, ids: &[String]) -> Result<Vec<TokenRef>, StoreError> {
    let rows = select_by_keys(pool, "SELECT * FROM token_dict WHERE id IN (", ids).await?;

    rows.iter()
        .map(|row| {
            Ok(TokenRef {
                id: row.try_get("id")?,
                chain: row.try_get("chain")?,
                name: row.try_get("name")?,
                symbol: row.try_get("symbol")?,
                display_symbol: row.try_get("display_symbol")?,
                optimized_symbol: row.try_get("optimized_symbol")?,
                decimals: row.try_get("decimals")?,
                logo_url: row.try_get("logo_url")?,
                protocol_id: row.try_get("protocol_id")?,
                price: row.try_get("price")?,
                price_24h_change: row.try_get("price_24h_change")?,
                is_verified: row.try_get("is_verified")?,
                is_core: row.try_get("is_core")?,
                is_wallet: row.try_get("is_wallet")?,
                is_scam: row.try_get("is_scam")?,
                is_suspicious: row.try_get("is_suspicious")?,
                credit_score: row.try_get("credit_score")?,
                total_supply: row.try_get("total_supply")?,
                time_at: row.try_get("time_at")?,
            })
        })
        .collect()
}

pub async fn get_counterparties(pool: &Pool<Sqlite>, addresses: &[String]) -> Result<Vec<CounterpartyRef>, StoreError> {
    let addresses: Vec<String> = addresses.iter().map(|a| a.to_lowercase()).collect();
    let rows = select_by_keys(pool, "SELECT * FROM cex_dict WHERE address IN (", &addresses).await?;

    rows.iter()
        .map(|row| {
            Ok(CounterpartyRef {
                address: row.try_get("address")?,
                cex_id: row.try_get("cex_id")?,
                name: row.try_get("name")?,
                logo_url: row.try_get("logo_url")?,
                is_deposit: row.try_get("is_deposit")?,
                is_collect: row.try_get("is_collect")?,
                is_gastopup: row.try_get("is_gastopup")?,
                is_vault: row.try_get("is_vault")?,
                is_withdraw: row.try_get("is_withdraw")?,
            })
        })
        .collect()
}

/// Runs `prefix` followed by a bound `IN (...)` list, in chunks.
async fn select_by_keys(pool: &Pool<Sqlite>, prefix: &str, keys: &[String]) -> Result<Vec<SqliteRow>, StoreError> {
    let mut rows = Vec::new();

    for chunk in keys.chunks(LOOKUP_CHUNK) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(prefix);
        let mut separated = builder.separated(", ");
        for key in chunk {
            separated.push_bind(key.clone());
        }
        separated.push_unseparated(")");

        rows.extend(builder.build().fetch_all(pool).await?);
    }

    Ok(rows)
}
