use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::{Listing, PetQuantities};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, instrument};

fn parse_side(column: usize, json: &str) -> rusqlite::Result<PetQuantities> {
    serde_json::from_str(json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
    let haves_json: String = row.get(2)?;
    let wants_json: String = row.get(3)?;
    Ok(Listing {
        id: row.get(0)?,
        owner: row.get(1)?,
        haves: parse_side(2, &haves_json)?,
        wants: parse_side(3, &wants_json)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const LISTING_COLUMNS: &str =
    "id, owner, haves_json, wants_json, description, created_at, updated_at";

fn fetch_listing(conn: &Connection, listing_id: i64) -> Result<Option<Listing>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM listings WHERE id = ?1",
        LISTING_COLUMNS
    ))?;
    stmt.query_row(params![listing_id], listing_from_row)
        .optional()
        .map_err(Error::from)
}

/// Creates a new listing and returns its store-assigned ID.
///
/// Either side may be empty; a listing with both sides empty is degenerate
/// but accepted. The capacity cap is the validation layer's job and is not
/// re-checked here.
#[instrument(skip(pool, haves, wants, description))]
pub async fn create_listing(
    pool: &DbPool,
    owner: i64,
    haves: &PetQuantities,
    wants: &PetQuantities,
    description: Option<&str>,
) -> Result<i64> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for creating listing".to_string()))?;

    let haves_json = serde_json::to_string(haves)?;
    let wants_json = serde_json::to_string(wants)?;
    let now = Utc::now();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO listings (owner, haves_json, wants_json, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )?;
    let listing_id = stmt.insert(params![owner, haves_json, wants_json, description, now])?;
    info!("Created listing {} for user {}", listing_id, owner);
    Ok(listing_id)
}

/// Fetches a single listing by ID.
#[instrument(skip(pool))]
pub async fn get_listing(pool: &DbPool, listing_id: i64) -> Result<Option<Listing>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let listing = fetch_listing(&conn, listing_id)?;
    debug!(
        "Listing lookup for id {}: {}",
        listing_id,
        if listing.is_some() { "found" } else { "not found" }
    );
    Ok(listing)
}

/// Fetches all listings owned by `owner`. No ordering is guaranteed here;
/// the query engine applies filter and sort selectors on top.
#[instrument(skip(pool))]
pub async fn get_user_listings(pool: &DbPool, owner: i64) -> Result<Vec<Listing>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM listings WHERE owner = ?1",
        LISTING_COLUMNS
    ))?;
    let listing_iter = stmt.query_map(params![owner], listing_from_row)?;

    let mut listings = Vec::new();
    for listing_result in listing_iter {
        listings.push(
            listing_result
                .map_err(|e| Error::Database(format!("Failed to map listing row: {}", e)))?,
        );
    }
    debug!("Fetched {} listings for user {}", listings.len(), owner);
    Ok(listings)
}

/// Fetches every listing in the store (admin overview, search base).
#[instrument(skip(pool))]
pub async fn get_all_listings(pool: &DbPool) -> Result<Vec<Listing>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM listings ORDER BY id DESC",
        LISTING_COLUMNS
    ))?;
    let listing_iter = stmt.query_map([], listing_from_row)?;

    let mut listings = Vec::new();
    for listing_result in listing_iter {
        listings.push(
            listing_result
                .map_err(|e| Error::Database(format!("Failed to map listing row: {}", e)))?,
        );
    }
    debug!("Fetched {} listings total", listings.len());
    Ok(listings)
}

// Argument struct for a partial update; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct UpdateListingArgs<'a> {
    pub haves: Option<&'a PetQuantities>,
    pub wants: Option<&'a PetQuantities>,
    pub description: Option<&'a str>,
}

/// Replaces only the supplied fields of a listing and bumps `updated_at`.
///
/// # Errors
///
/// Returns `Error::NotFound` if no listing with the given ID exists.
#[instrument(skip(pool, args))]
pub async fn update_listing(
    pool: &DbPool,
    listing_id: i64,
    args: &UpdateListingArgs<'_>,
) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for update".to_string()))?;

    let current = fetch_listing(&conn, listing_id)?
        .ok_or_else(|| Error::NotFound(format!("Listing #{}", listing_id)))?;

    let haves_json = serde_json::to_string(args.haves.unwrap_or(&current.haves))?;
    let wants_json = serde_json::to_string(args.wants.unwrap_or(&current.wants))?;
    let description = match args.description {
        Some(d) => Some(d.to_string()),
        None => current.description,
    };
    let now = Utc::now();

    conn.execute(
        "UPDATE listings SET haves_json = ?1, wants_json = ?2, description = ?3, updated_at = ?4
         WHERE id = ?5",
        params![haves_json, wants_json, description, now, listing_id],
    )?;
    info!("Updated listing {}", listing_id);
    Ok(())
}

/// Deletes a listing by ID. Idempotent: deleting an absent ID is a no-op
/// success. Returns whether a row was actually removed so the caller can
/// phrase its reply.
#[instrument(skip(pool))]
pub async fn delete_listing(pool: &DbPool, listing_id: i64) -> Result<bool> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for delete".to_string()))?;
    let rows_affected = conn.execute("DELETE FROM listings WHERE id = ?1", params![listing_id])?;
    if rows_affected > 0 {
        info!("Deleted listing {}", listing_id);
    } else {
        debug!("Delete for absent listing {} was a no-op", listing_id);
    }
    Ok(rows_affected > 0)
}

/// Deletes every listing owned by `owner` (admin override). Returns the
/// number of listings removed.
#[instrument(skip(pool))]
pub async fn delete_user_listings(pool: &DbPool, owner: i64) -> Result<usize> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for delete".to_string()))?;
    let rows_affected = conn.execute("DELETE FROM listings WHERE owner = ?1", params![owner])?;
    info!("Deleted {} listing(s) owned by user {}", rows_affected, owner);
    Ok(rows_affected)
}

/// Returns every listing where `fragment` case-insensitively
/// substring-matches a pet name in either `haves` or `wants`.
///
/// The quantity maps live in JSON columns, so the match runs over rows
/// already materialized in memory rather than in SQL.
#[instrument(skip(pool))]
pub async fn search_listings(pool: &DbPool, fragment: &str) -> Result<Vec<Listing>> {
    let all = get_all_listings(pool).await?;
    let needle = fragment.to_lowercase();

    let matches: Vec<Listing> = all
        .into_iter()
        .filter(|listing| {
            listing
                .haves
                .keys()
                .chain(listing.wants.keys())
                .any(|name| name.to_lowercase().contains(&needle))
        })
        .collect();
    debug!("Search for '{}' matched {} listing(s)", fragment, matches.len());
    Ok(matches)
}
