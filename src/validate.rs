//! Input validation and display formatting for listing quantities.
//!
//! Every function here is pure: a total function of its inputs modulo the
//! declared `Error::Validation` failures. Nothing in this module touches the
//! database.

use crate::errors::{Error, Result};
use crate::models::{PetQuantities, Rarity, RarityQuantities};

/// Largest quantity accepted for a single rarity tier.
pub const MAX_QUANTITY: u32 = 10_000;

/// Cap on the total item count (summed quantities) across a listing's
/// `haves` and `wants`, checked before anything reaches the store.
pub const MAX_ITEMS_PER_LISTING: u64 = 50;

/// Validates a raw quantity string.
///
/// Blank input means "absent" and maps to 0 rather than an error, so optional
/// form fields can be left empty. Anything else must parse as an integer in
/// `1..=MAX_QUANTITY`.
pub fn validate_quantity(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let qty: u32 = trimmed
        .parse()
        .map_err(|_| Error::Validation(format!("'{}' is not a valid number", trimmed)))?;
    if qty < 1 || qty > MAX_QUANTITY {
        return Err(Error::Validation(format!(
            "Quantity must be between 1 and {}",
            MAX_QUANTITY
        )));
    }
    Ok(qty)
}

/// Validates a raw rarity string against the fixed rarity set,
/// case-insensitively.
pub fn validate_rarity(raw: &str) -> Result<Rarity> {
    raw.parse()
}

/// Parses a comma-separated `Rarity:Quantity` list, e.g. `"Legendary:5, Mythic:3"`.
///
/// Fails on malformed segments, unknown rarities, and out-of-range
/// quantities. A blank quantity (`"Legendary:"`) means "absent" and the entry
/// is omitted. An input that yields no entries at all is an error. Duplicate
/// rarities: the last occurrence wins.
pub fn parse_quantities(raw: &str) -> Result<RarityQuantities> {
    let mut quantities = RarityQuantities::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((rarity_str, qty_str)) = entry.split_once(':') else {
            return Err(Error::Validation(format!(
                "Invalid format: '{}'. Use 'Rarity:Quantity' (e.g., 'Legendary:5')",
                entry
            )));
        };
        if qty_str.contains(':') {
            return Err(Error::Validation(format!(
                "Invalid format: '{}'. Use 'Rarity:Quantity'",
                entry
            )));
        }

        let rarity = validate_rarity(rarity_str)?;
        let qty = validate_quantity(qty_str)?;
        if qty == 0 {
            quantities.remove(&rarity);
            continue;
        }
        quantities.insert(rarity, qty);
    }

    if quantities.is_empty() {
        return Err(Error::Validation("No valid quantities provided".to_string()));
    }
    Ok(quantities)
}

/// Renders a rarity->quantity map for display, e.g. `"Legendary: 5 | Mythic: 3"`.
///
/// Tiers appear in the fixed display order; zero-quantity entries are
/// omitted; an empty map renders as `"None"`.
pub fn format_quantities(quantities: &RarityQuantities) -> String {
    let parts: Vec<String> = Rarity::ALL
        .iter()
        .filter_map(|rarity| match quantities.get(rarity) {
            Some(&qty) if qty > 0 => Some(format!("{}: {}", rarity, qty)),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        "None".to_string()
    } else {
        parts.join(" | ")
    }
}

fn side_total(side: &PetQuantities) -> u64 {
    side.values()
        .flat_map(|quantities| quantities.values())
        .map(|&q| u64::from(q))
        .sum()
}

/// Enforces the per-listing capacity cap across the union of `haves` and
/// `wants`. Called at the command boundary before any create/update reaches
/// the persistence layer.
pub fn ensure_listing_capacity(haves: &PetQuantities, wants: &PetQuantities) -> Result<()> {
    let total = side_total(haves) + side_total(wants);
    if total > MAX_ITEMS_PER_LISTING {
        return Err(Error::Validation(format!(
            "A listing may hold at most {} items in total; this one would hold {}",
            MAX_ITEMS_PER_LISTING, total
        )));
    }
    Ok(())
}
