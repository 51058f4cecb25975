use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::Pet;
use rusqlite::{OptionalExtension, params};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

/// Seeds the pet catalog from configuration if the `pets` table is empty.
///
/// The catalog is static reference data: once seeded it is read-only for the
/// rest of the run, so reseeding on a populated table is a no-op.
#[instrument(skip(pool, config))]
pub async fn seed_pets(pool: &DbPool, config: &Arc<AppConfig>) -> Result<()> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for seeding pets".to_string()))?;

    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM pets", [], |row| row.get(0))?;
    if existing > 0 {
        debug!("Pets table already has {} entries. Skipping seed.", existing);
        return Ok(());
    }

    let mut stmt = conn.prepare_cached("INSERT INTO pets (name, image_url) VALUES (?1, ?2)")?;
    for pet in &config.pets {
        stmt.execute(params![pet.name, pet.image_url])?;
    }
    info!("Loaded {} pets into database", config.pets.len());
    Ok(())
}

/// Fetches all pets, ordered by name.
#[instrument(skip(pool))]
pub async fn get_all_pets(pool: &DbPool) -> Result<Vec<Pet>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt =
        conn.prepare_cached("SELECT id, name, image_url FROM pets ORDER BY name ASC")?;
    let pet_iter = stmt.query_map([], |row| {
        Ok(Pet {
            id: row.get(0)?,
            name: row.get(1)?,
            image_url: row.get(2)?,
        })
    })?;

    let mut pets = Vec::new();
    for pet_result in pet_iter {
        pets.push(pet_result.map_err(|e| Error::Database(format!("Failed to map pet row: {}", e)))?);
    }
    debug!("Fetched {} pets.", pets.len());
    Ok(pets)
}

/// Fetches a pet by name, case-insensitively.
#[instrument(skip(pool))]
pub async fn get_pet_by_name(pool: &DbPool, pet_name: &str) -> Result<Option<Pet>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, image_url FROM pets WHERE LOWER(name) = LOWER(?1)",
    )?;
    let pet_result = stmt
        .query_row(params![pet_name], |row| {
            Ok(Pet {
                id: row.get(0)?,
                name: row.get(1)?,
                image_url: row.get(2)?,
            })
        })
        .optional()?;

    debug!(
        "Pet lookup by name '{}': {:?}",
        pet_name,
        pet_result.as_ref().map(|p| &p.id)
    );
    Ok(pet_result)
}

/// Suggests pet names for autocomplete: case-insensitive prefix match,
/// alphabetical, capped at Discord's 25-choice limit.
#[instrument(skip(pool))]
pub async fn suggest_pet_names(pool: &DbPool, partial_name: &str) -> Result<Vec<String>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let lower_partial_name = partial_name.to_lowercase();
    let search_pattern = format!("{}%", lower_partial_name);

    let mut stmt = conn.prepare_cached(
        "SELECT name FROM pets
         WHERE LOWER(name) LIKE ?1
         ORDER BY name ASC
         LIMIT 25",
    )?;
    let names_iter = stmt.query_map(params![search_pattern], |row| row.get(0))?;
    let mut names = Vec::new();
    for name_result in names_iter {
        names.push(
            name_result.map_err(|e| Error::Database(format!("Failed to map pet name: {}", e)))?,
        );
    }
    trace!(
        "Suggested pet names for partial '{}': {:?}",
        partial_name, names
    );
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PetConfig;
    use crate::db::test_utils::{direct_insert_pet, init_test_tracing, setup_test_db};

    fn config_with_pets(names: &[&str]) -> Arc<AppConfig> {
        Arc::new(AppConfig {
            database_path: String::new(),
            admin_user_ids: vec![],
            pets: names
                .iter()
                .map(|name| PetConfig {
                    name: (*name).to_string(),
                    image_url: format!("https://example.com/{}.webp", name.to_lowercase()),
                })
                .collect(),
        })
    }

    #[tokio::test]
    async fn test_seed_pets_once() -> Result<()> {
        init_test_tracing();
        let pool = setup_test_db().await?;
        let config = config_with_pets(&["Delve", "Bramble", "Kragg"]);

        seed_pets(&pool, &config).await?;
        let pets = get_all_pets(&pool).await?;
        assert_eq!(pets.len(), 3);
        // Name order, not insertion order.
        assert_eq!(pets[0].name, "Bramble");
        assert_eq!(pets[1].name, "Delve");
        assert_eq!(pets[2].name, "Kragg");

        // Seeding again must not duplicate the catalog.
        seed_pets(&pool, &config).await?;
        assert_eq!(get_all_pets(&pool).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_pet_by_name_case_insensitive() -> Result<()> {
        let pool = setup_test_db().await?;
        {
            let conn = pool.lock().unwrap();
            direct_insert_pet(&conn, "Delve", "https://example.com/delve.webp")?;
        }

        let pet = get_pet_by_name(&pool, "delve").await?.expect("pet exists");
        assert_eq!(pet.name, "Delve");
        assert_eq!(pet.image_url, "https://example.com/delve.webp");

        let pet_upper = get_pet_by_name(&pool, "DELVE").await?;
        assert!(pet_upper.is_some());

        assert!(get_pet_by_name(&pool, "Nonexistent").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_suggest_pet_names_prefix_match() -> Result<()> {
        let pool = setup_test_db().await?;
        {
            let conn = pool.lock().unwrap();
            direct_insert_pet(&conn, "Grimm", "https://example.com/grimm.webp")?;
            direct_insert_pet(&conn, "Malgrim", "https://example.com/malgrim.webp")?;
            direct_insert_pet(&conn, "Mimic", "https://example.com/mimic.webp")?;
        }

        // Prefix match, not substring: "gr" finds Grimm but not Malgrim.
        let suggestions = suggest_pet_names(&pool, "gr").await?;
        assert_eq!(suggestions, vec!["Grimm"]);

        let suggestions = suggest_pet_names(&pool, "m").await?;
        assert_eq!(suggestions, vec!["Malgrim", "Mimic"]);

        // Empty partial returns the whole catalog (up to the limit).
        let suggestions = suggest_pet_names(&pool, "").await?;
        assert_eq!(suggestions.len(), 3);

        assert!(suggest_pet_names(&pool, "xyz").await?.is_empty());
        Ok(())
    }
}
