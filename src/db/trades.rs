use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{Rarity, Trade};
use chrono::{DateTime, Utc};
use rusqlite::{Row, params};
use tracing::{debug, info, instrument};

fn rarity_from_column(column: usize, raw: &str) -> rusqlite::Result<Rarity> {
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            format!("{}", e).into(),
        )
    })
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    let gave_rarity: String = row.get(4)?;
    let received_rarity: String = row.get(7)?;
    Ok(Trade {
        id: row.get(0)?,
        user_id: row.get(1)?,
        gave_pet: row.get(2)?,
        gave_qty: row.get(3)?,
        gave_rarity: rarity_from_column(4, &gave_rarity)?,
        received_pet: row.get(5)?,
        received_qty: row.get(6)?,
        received_rarity: rarity_from_column(7, &received_rarity)?,
        created_at: row.get(8)?,
    })
}

// Argument struct for recording a completed trade.
#[derive(Debug)]
pub struct RecordTradeArgs<'a> {
    pub user_id: i64,
    pub gave_pet: &'a str,
    pub gave_qty: u32,
    pub gave_rarity: Rarity,
    pub received_pet: &'a str,
    pub received_qty: u32,
    pub received_rarity: Rarity,
}

/// Records a completed trade for price tracking and returns its ID.
#[instrument(skip(pool, args))]
pub async fn record_trade(pool: &DbPool, args: &RecordTradeArgs<'_>) -> Result<i64> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for recording trade".to_string()))?;
    let now = Utc::now();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO trades (user_id, gave_pet, gave_qty, gave_rarity,
                             received_pet, received_qty, received_rarity, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let trade_id = stmt.insert(params![
        args.user_id,
        args.gave_pet,
        args.gave_qty,
        args.gave_rarity.as_str(),
        args.received_pet,
        args.received_qty,
        args.received_rarity.as_str(),
        now,
    ])?;
    info!(
        "Recorded trade {} by user {}: gave {}x {} ({}), received {}x {} ({})",
        trade_id,
        args.user_id,
        args.gave_qty,
        args.gave_pet,
        args.gave_rarity,
        args.received_qty,
        args.received_pet,
        args.received_rarity
    );
    Ok(trade_id)
}

/// Fetches trades where `pet_name` was the pet given away, newest first,
/// restricted to trades recorded after `cutoff`. The pricing layer
/// aggregates these into per-rarity averages.
#[instrument(skip(pool))]
pub async fn get_trades_where_gave(
    pool: &DbPool,
    pet_name: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Trade>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, user_id, gave_pet, gave_qty, gave_rarity,
                received_pet, received_qty, received_rarity, created_at
         FROM trades
         WHERE LOWER(gave_pet) = LOWER(?1) AND created_at > ?2
         ORDER BY created_at DESC",
    )?;
    let trade_iter = stmt.query_map(params![pet_name, cutoff], trade_from_row)?;

    let mut trades = Vec::new();
    for trade_result in trade_iter {
        trades.push(
            trade_result.map_err(|e| Error::Database(format!("Failed to map trade row: {}", e)))?,
        );
    }
    debug!(
        "Fetched {} trade(s) where '{}' was given since {}",
        trades.len(),
        pet_name,
        cutoff
    );
    Ok(trades)
}
