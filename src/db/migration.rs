use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // One row per (event, chain, owned address). The implicit rowid records
    // insertion order and breaks timestamp ties on read.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS address_history (
            id TEXT NOT NULL,
            chain TEXT NOT NULL,
            address TEXT NOT NULL,
            cate_id TEXT,
            time_at INTEGER,
            is_scam BOOLEAN NOT NULL DEFAULT 0,
            payload TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            PRIMARY KEY (id, chain, address)
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS project_dict (
            id TEXT PRIMARY KEY,
            chain TEXT,
            name TEXT,
            logo_url TEXT,
            site_url TEXT
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS token_dict (
            id TEXT PRIMARY KEY,
            chain TEXT,
            name TEXT,
            symbol TEXT,
            display_symbol TEXT,
            optimized_symbol TEXT,
            decimals INTEGER,
            logo_url TEXT,
            protocol_id TEXT,
            price REAL,
            price_24h_change REAL,
            is_verified BOOLEAN,
            is_core BOOLEAN,
            is_wallet BOOLEAN,
            is_scam BOOLEAN,
            is_suspicious BOOLEAN,
            credit_score REAL,
            total_supply REAL,
            time_at REAL
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS cex_dict (
            address TEXT PRIMARY KEY,
            cex_id TEXT,
            name TEXT,
            logo_url TEXT,
            is_deposit BOOLEAN,
            is_collect BOOLEAN,
            is_gastopup BOOLEAN,
            is_vault BOOLEAN,
            is_withdraw BOOLEAN
        )"
    )
    .execute(pool)
    .await?;

    // Add indexes for the read path
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_address_history_address_time
         ON address_history(address, time_at)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_address_history_time
         ON address_history(time_at)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
