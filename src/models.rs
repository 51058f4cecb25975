use crate::errors::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Quality tier of a pet. The variant order is the fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Legendary,
    Mythic,
}

impl Rarity {
    /// All tiers, in display order.
    pub const ALL: [Rarity; 2] = [Rarity::Legendary, Rarity::Mythic];

    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legendary" => Ok(Rarity::Legendary),
            "mythic" => Ok(Rarity::Mythic),
            _ => Err(Error::Validation(format!(
                "'{}' is not a valid rarity. Valid options: Legendary, Mythic",
                s.trim()
            ))),
        }
    }
}

/// Rarity tier -> quantity for a single pet.
pub type RarityQuantities = BTreeMap<Rarity, u32>;

/// Pet name -> per-rarity quantities. This is the structure serialized into
/// the `haves_json`/`wants_json` columns and must round-trip unchanged.
pub type PetQuantities = BTreeMap<String, RarityQuantities>;

// Based on the "listings" table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Listing {
    pub id: i64, // Primary Key, INTEGER
    pub owner: i64, // Discord user ID of the creator, never changes
    pub haves: PetQuantities,
    pub wants: PetQuantities,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>, // Assigned at creation, immutable
    pub updated_at: DateTime<Utc>, // Bumped on every edit
}

impl Listing {
    /// Total item count across `haves` and `wants` (summed quantities).
    /// This is what the `most`/`least` sort orders and the per-listing
    /// capacity cap are measured against.
    pub fn total_items(&self) -> u64 {
        let sum = |side: &PetQuantities| -> u64 {
            side.values()
                .flat_map(|quantities| quantities.values())
                .map(|&q| u64::from(q))
                .sum()
        };
        sum(&self.haves) + sum(&self.wants)
    }

    /// Whether the listing offers anything. Membership in the filter buckets
    /// is decided by key presence, not quantities.
    pub fn has_offers(&self) -> bool {
        !self.haves.is_empty()
    }

    /// Whether the listing requests anything.
    pub fn has_requests(&self) -> bool {
        !self.wants.is_empty()
    }
}

// Based on the "pets" table (static catalog, seeded once)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Pet {
    pub id: i64,
    pub name: String, // Unique
    pub image_url: String,
}

// Based on the "trades" table (completed trades, for price tracking)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Trade {
    pub id: i64,
    pub user_id: i64,
    pub gave_pet: String,
    pub gave_qty: u32,
    pub gave_rarity: Rarity,
    pub received_pet: String,
    pub received_qty: u32,
    pub received_rarity: Rarity,
    pub created_at: DateTime<Utc>,
}
