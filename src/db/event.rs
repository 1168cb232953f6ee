// Event store queries:
// - insert_event(executor, event) -> Result<bool>  (insert-if-absent)
// - insert_events(pool, events) -> Result<usize>  (one transaction per page)
// - event_exists(pool, key) -> Result<bool>
// - fetch_events(pool, query, offset, limit) -> Result<Vec<RawEvent>>
//   Ordered by time_at DESC with NULL timestamps last, ties by insertion order.

use crate::db::{EventQuery, StoreError};
use crate::models::{EventKey, RawEvent};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, SqliteExecutor};

pub async fn insert_event<'c, E>(executor: E, event: &RawEvent) -> Result<bool, StoreError>
where
    E: SqliteExecutor<'c>,
{
    let payload = serde_json::to_string(&event.payload)?;

    let result = sqlx::query(
        r#"
        INSERT INTO address_history (id, chain, address, cate_id, time_at, is_scam, payload)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id, chain, address) DO NOTHING
        "#,
    )
    .bind(&event.id)
    .bind(&event.chain)
    .bind(&event.address)
    .bind(&event.cate_id)
    .bind(event.time_at)
    .bind(event.is_scam)
    .bind(payload)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn insert_events(pool: &Pool<Sqlite>, events: &[RawEvent]) -> Result<usize, StoreError> {
    // Start a transaction for the page
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for event in events {
        if insert_event(&mut *tx, event).await? {
            inserted += 1;
        }
    }

    tx.commit().await?;

    Ok(inserted)
}

pub async fn event_exists(pool: &Pool<Sqlite>, key: EventKey<'_>) -> Result<bool, StoreError> {
    let row = sqlx::query("SELECT 1 FROM address_history WHERE id = ? AND chain = ? AND address = ?")
        .bind(key.id)
        .bind(key.chain)
        .bind(key.address)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

pub async fn fetch_events(
    pool: &Pool<Sqlite>,
    query: &EventQuery,
    offset: i64,
    limit: i64,
) -> Result<Vec<RawEvent>, StoreError> {
    if query.owners.is_empty() || limit <= 0 {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, chain, address, cate_id, time_at, is_scam, payload \
         FROM address_history WHERE address IN (",
    );
    let mut owners = builder.separated(", ");
    for owner in &query.owners {
        owners.push_bind(owner.to_lowercase());
    }
    owners.push_unseparated(")");

    if let Some(chain) = &query.chain {
        builder.push(" AND chain = ").push_bind(chain.clone());
    }
    if !query.include_scam {
        builder.push(" AND is_scam = 0");
    }

    builder
        .push(" ORDER BY time_at IS NULL, time_at DESC, rowid ASC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = builder.build().fetch_all(pool).await?;

    rows.iter().map(event_from_row).collect()
}

fn event_from_row(row: &SqliteRow) -> Result<RawEvent, StoreError> {
    let payload: String = row.try_get("payload")?;

    Ok(RawEvent {
        id: row.try_get("id")?,
        chain: row.try_get("chain")?,
        address: row.try_get("address")?,
        cate_id: row.try_get("cate_id")?,
        time_at: row.try_get("time_at")?,
        is_scam: row.try_get("is_scam")?,
        payload: serde_json::from_str(&payload)?,
    })
}
