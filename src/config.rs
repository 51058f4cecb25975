use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{env, fs, path::Path};
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEFAULT_DATABASE_PATH: &str = "data/auction_house.sqlite3";

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    /// Path of the SQLite database file. `DATABASE_PATH` in the environment
    /// overrides the value from config.toml.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Discord user IDs allowed to use the `/admin_*` commands. Loaded once
    /// at startup and passed through `Data`; there is no way to mutate this
    /// set at runtime.
    #[serde(default)]
    pub admin_user_ids: Vec<u64>,

    /// Pet catalog seeded into the `pets` table on first start.
    pub pets: Vec<PetConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PetConfig {
    pub name: String,
    pub image_url: String,
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

impl AppConfig {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_user_ids.contains(&user_id)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = fs::read_to_string(path_ref)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path_ref, e)))?;
    let app_config: AppConfig = toml::from_str(&contents).map_err(|e| {
        Error::Config(format!(
            "Failed to parse TOML from config file {:?}: {}",
            path_ref, e
        ))
    })?;
    Ok(app_config)
}

/// Loads the application configuration: `config.toml` (or `CONFIG_PATH`),
/// then environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_config(&config_path)?;

    if let Ok(db_path) = env::var("DATABASE_PATH") {
        info!("DATABASE_PATH override in effect: {}", db_path);
        config.database_path = db_path;
    }

    if config.pets.is_empty() {
        return Err(Error::Config(
            "Configuration must define at least one pet in [[pets]]".to_string(),
        ));
    }

    info!(
        "Loaded configuration: {} pets, {} admins, database at '{}'",
        config.pets.len(),
        config.admin_user_ids.len(),
        config.database_path
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
database_path = "data/test.sqlite3"
admin_user_ids = [184858845221224448]

[[pets]]
name = "Delve"
image_url = "https://example.com/delve.webp"

[[pets]]
name = "Bramble"
image_url = "https://example.com/bramble.webp"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.database_path, "data/test.sqlite3");
        assert_eq!(config.pets.len(), 2);
        assert_eq!(config.pets[0].name, "Delve");
        assert!(config.is_admin(184858845221224448));
        assert!(!config.is_admin(1));
    }

    #[test]
    fn test_database_path_defaults_when_absent() {
        let minimal = r#"
[[pets]]
name = "Delve"
image_url = "https://example.com/delve.webp"
"#;
        let config: AppConfig = toml::from_str(minimal).unwrap();
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert!(config.admin_user_ids.is_empty());
    }
}
