#![allow(dead_code)]
use crate::db::{DbPool, schema};
use crate::errors::{Error, Result};
use crate::models::PetQuantities;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer() // Crucial for `cargo test` output
        .try_init(); // Use try_init to avoid panic if already initialized
}

// Helper to create an in-memory DbPool for testing.
// Sets up the schema as well.
pub(crate) async fn setup_test_db() -> Result<DbPool> {
    let conn = Connection::open_in_memory()
        .map_err(|e| Error::Database(format!("Test DB: Failed to open in-memory: {}", e)))?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub(crate) struct DirectInsertListingArgs<'a> {
    pub(crate) conn: &'a Connection,
    pub(crate) owner: i64,
    pub(crate) haves: &'a PetQuantities,
    pub(crate) wants: &'a PetQuantities,
    pub(crate) description: Option<&'a str>,
    /// Controllable timestamp so sort-order tests are deterministic.
    pub(crate) created_at: DateTime<Utc>,
}

// Direct insert, bypassing `create_listing`, for focused tests that need
// explicit timestamps.
pub(crate) fn direct_insert_listing(args: &DirectInsertListingArgs<'_>) -> Result<i64> {
    let haves_json = serde_json::to_string(args.haves)?;
    let wants_json = serde_json::to_string(args.wants)?;
    let mut stmt = args.conn.prepare_cached(
        "INSERT INTO listings (owner, haves_json, wants_json, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )?;
    let id = stmt.insert(params![
        args.owner,
        haves_json,
        wants_json,
        args.description,
        args.created_at,
    ])?;
    Ok(id)
}

pub(crate) fn direct_insert_pet(conn: &Connection, name: &str, image_url: &str) -> Result<i64> {
    let mut stmt =
        conn.prepare_cached("INSERT INTO pets (name, image_url) VALUES (?1, ?2)")?;
    let id = stmt.insert(params![name, image_url])?;
    Ok(id)
}

// Convenience for building a one-pet quantity map in tests.
pub(crate) fn pet_entry(
    pet: &str,
    quantities: &[(crate::models::Rarity, u32)],
) -> PetQuantities {
    PetQuantities::from([(pet.to_string(), quantities.iter().copied().collect())])
}
