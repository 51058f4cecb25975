use crate::errors::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info, instrument};

#[instrument(skip(conn))]
pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    debug!("Executing CREATE TABLE statements if tables do not exist.");
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS pets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            image_url TEXT NOT NULL
        );

        -- haves_json/wants_json hold the nested pet -> {rarity -> quantity}
        -- maps as a single JSON value per side; each listing is one
        -- self-contained row, so every write is a single statement.
        CREATE TABLE IF NOT EXISTS listings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner INTEGER NOT NULL,
            haves_json TEXT NOT NULL DEFAULT '{}',
            wants_json TEXT NOT NULL DEFAULT '{}',
            description TEXT,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_listings_owner ON listings(owner);

        CREATE TABLE IF NOT EXISTS trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            gave_pet TEXT NOT NULL,
            gave_qty INTEGER NOT NULL,
            gave_rarity TEXT NOT NULL,
            received_pet TEXT NOT NULL,
            received_qty INTEGER NOT NULL,
            received_rarity TEXT NOT NULL,
            created_at DATETIME NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_trades_gave_pet ON trades(gave_pet);

        COMMIT;",
    )
    .map_err(|e| Error::Database(format!("Failed to create tables: {}", e)))?;
    info!("Database tables ensured.");
    Ok(())
}
