use crate::bot::Context;
use crate::db::{self, DbPool};
use crate::errors::Result;
use crate::models::{Listing, PetQuantities};
use crate::query::SearchMatch;
use crate::validate::format_quantities;
use poise::serenity_prelude::AutocompleteChoice;
use tracing::{error, trace};

/// Results shown per section before an "... and N more" overflow line.
pub(crate) const ITEMS_PER_PAGE: usize = 5;

/// Renders one side of a listing, e.g.
/// `"Delve (Legendary: 5 | Mythic: 3), Kragg (Mythic: 1)"`.
pub(crate) fn format_pet_section(side: &PetQuantities) -> String {
    if side.is_empty() {
        return "None".to_string();
    }
    side.iter()
        .map(|(pet, quantities)| format!("{} ({})", pet, format_quantities(quantities)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds an embed field (name, value) for a listing in `/my_listings`.
pub(crate) fn listing_field(listing: &Listing) -> (String, String) {
    let field_name = format!("📌 Listing #{}", listing.id);
    let field_value = format!(
        "**Have:** {}\n**Want:** {}\n**Desc:** {}",
        format_pet_section(&listing.haves),
        format_pet_section(&listing.wants),
        listing.description.as_deref().unwrap_or("N/A")
    );
    (field_name, field_value)
}

/// Builds a one-line summary for a search hit, mentioning the owner.
pub(crate) fn search_result_line(hit: &SearchMatch) -> String {
    let listing = &hit.listing;
    let mut line = format!(
        "**ID {} by <@{}>**: Offers: {} | Wants: {}",
        listing.id,
        listing.owner,
        format_pet_section(&listing.haves),
        format_pet_section(&listing.wants)
    );
    if let Some(desc) = &listing.description {
        line.push_str(&format!(" | Note: {}", desc));
    }
    line
}

/// Joins up to [`ITEMS_PER_PAGE`] lines, appending an overflow marker when
/// more results exist.
pub(crate) fn paginate_lines(lines: &[String]) -> String {
    let mut text = lines
        .iter()
        .take(ITEMS_PER_PAGE)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    if lines.len() > ITEMS_PER_PAGE {
        text.push_str(&format!("\n... and {} more", lines.len() - ITEMS_PER_PAGE));
    }
    text
}

/// Picks a thumbnail for a listing: the catalog image of the first pet in
/// `haves`, falling back to the first in `wants`.
pub(crate) async fn listing_thumbnail(pool: &DbPool, listing: &Listing) -> Result<Option<String>> {
    for name in listing.haves.keys().chain(listing.wants.keys()) {
        if let Some(pet) = db::get_pet_by_name(pool, name).await? {
            return Ok(Some(pet.image_url));
        }
    }
    Ok(None)
}

pub(crate) async fn pet_name_autocomplete(
    ctx: Context<'_>,
    partial: &str,
) -> Vec<AutocompleteChoice> {
    trace!(user = %ctx.author().name, partial_input = partial, "Autocomplete request received for pet name");

    let db_pool = &ctx.data().db_pool;
    match db::suggest_pet_names(db_pool, partial).await {
        Ok(names) => names
            .into_iter()
            .map(|name| AutocompleteChoice::new(name.clone(), name))
            .collect(),
        Err(e) => {
            error!("Autocomplete: Failed to fetch pet suggestions: {:?}", e);
            Vec::new()
        }
    }
}
