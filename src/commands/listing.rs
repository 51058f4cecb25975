use crate::bot::{Context, Error};
use crate::commands::utils::{
    format_pet_section, listing_field, listing_thumbnail, paginate_lines, pet_name_autocomplete,
    search_result_line,
};
use crate::db::{self, UpdateListingArgs};
use crate::errors::Result;
use crate::models::{PetQuantities, RarityQuantities};
use crate::query::{self, ListingFilter, ListingSort, SearchType};
use crate::validate::{MAX_QUANTITY, ensure_listing_capacity, parse_quantities};
use poise::serenity_prelude as serenity;
use tracing::{info, instrument, warn};

/// Parses one optional `Rarity:Qty` input into the quantity map for `pet`.
/// A missing or blank argument means that side is empty.
fn parse_side(pet: &str, raw: Option<&str>) -> Result<PetQuantities> {
    match raw.map(str::trim) {
        None | Some("") => Ok(PetQuantities::new()),
        Some(input) => {
            let quantities = parse_quantities(input)?;
            Ok(PetQuantities::from([(pet.to_string(), quantities)]))
        }
    }
}

/// Creates a new trade listing for one pet.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn create_listing(
    ctx: Context<'_>,
    #[description = "Pet to list"]
    #[autocomplete = "pet_name_autocomplete"]
    pet: String,
    #[description = "Quantities you HAVE, e.g. 'Legendary:5, Mythic:3'"] haves: Option<String>,
    #[description = "Quantities you WANT, e.g. 'Mythic:2'"] wants: Option<String>,
    #[description = "Optional note shown with the listing"] description: Option<String>,
) -> Result<()> {
    let owner = ctx.author().id.get() as i64;
    info!(
        "Create_listing from {} ({}): pet='{}', haves={:?}, wants={:?}",
        ctx.author().name,
        owner,
        pet,
        haves,
        wants
    );

    let db_pool = &ctx.data().db_pool;

    // The pet must exist in the catalog; use its canonical spelling.
    let Some(catalog_pet) = db::get_pet_by_name(db_pool, &pet).await? else {
        let available = db::get_all_pets(db_pool)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect::<Vec<_>>()
            .join(", ");
        ctx.say(format!(
            "❌ Pet '{}' not found in database.\nAvailable pets: {}",
            pet, available
        ))
        .await?;
        return Ok(());
    };

    let haves_map = match parse_side(&catalog_pet.name, haves.as_deref()) {
        Ok(map) => map,
        Err(e @ Error::Validation(_)) => {
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let wants_map = match parse_side(&catalog_pet.name, wants.as_deref()) {
        Ok(map) => map,
        Err(e @ Error::Validation(_)) => {
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if haves_map.is_empty() && wants_map.is_empty() {
        ctx.say("❌ Provide quantities for at least one of `haves` or `wants`.")
            .await?;
        return Ok(());
    }
    if let Err(e) = ensure_listing_capacity(&haves_map, &wants_map) {
        ctx.say(e.user_message()).await?;
        return Ok(());
    }

    let listing_id = db::create_listing(
        db_pool,
        owner,
        &haves_map,
        &wants_map,
        description.as_deref(),
    )
    .await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ Created listing #{} for **{}**!\n**Have:** {}\n**Want:** {}",
                listing_id,
                catalog_pet.name,
                format_pet_section(&haves_map),
                format_pet_section(&wants_map)
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Shows your listings with optional filtering and sorting.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn my_listings(
    ctx: Context<'_>,
    #[description = "Filter: all, have, want, or both"] filter_by: Option<String>,
    #[description = "Sort: newest, oldest, most, or least"] sort_by: Option<String>,
) -> Result<()> {
    let owner = ctx.author().id.get() as i64;
    info!(
        "My_listings from {} ({}): filter={:?}, sort={:?}",
        ctx.author().name,
        owner,
        filter_by,
        sort_by
    );

    // Unknown selector values are reported, never silently defaulted.
    let filter: ListingFilter = match filter_by.as_deref().unwrap_or("all").parse() {
        Ok(f) => f,
        Err(e) => {
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
    };
    let sort: ListingSort = match sort_by.as_deref().unwrap_or("newest").parse() {
        Ok(s) => s,
        Err(e) => {
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
    };

    ctx.defer_ephemeral().await?;
    let db_pool = &ctx.data().db_pool;
    let listings = query::filtered_sorted_listings(db_pool, owner, filter, sort).await?;

    if listings.is_empty() {
        let filter_text = if filter == ListingFilter::All {
            String::new()
        } else {
            format!(" with filter '{}'", filter.describe())
        };
        ctx.say(format!(
            "You don't have any listings{}. Use `/create_listing` to create one!",
            filter_text
        ))
        .await?;
        return Ok(());
    }

    // Discord embeds cap out at 25 fields.
    let embed_fields: Vec<(String, String, bool)> = listings
        .iter()
        .take(25)
        .map(|listing| {
            let (name, value) = listing_field(listing);
            (name, value, false)
        })
        .collect();

    let mut listings_embed = serenity::CreateEmbed::default()
        .title("📋 Your Listings")
        .color(0x2ECC71)
        .description(format!(
            "Showing {} listing(s) | Filter: {} | Sort: {}",
            listings.len(),
            filter.describe(),
            sort.describe()
        ))
        .fields(embed_fields);
    if listings.len() > 25 {
        listings_embed = listings_embed.footer(serenity::CreateEmbedFooter::new(format!(
            "Showing first 25 of {} listings",
            listings.len()
        )));
    }

    ctx.send(poise::CreateReply::default().embed(listings_embed))
        .await?;
    Ok(())
}

/// Searches all listings for a pet, split into offers and requests.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn search(
    ctx: Context<'_>,
    #[description = "The pet to search for"]
    #[autocomplete = "pet_name_autocomplete"]
    item: String,
    #[description = "Type: all, offers, or requests"] search_type: Option<String>,
) -> Result<()> {
    info!(
        "Search from {}: item='{}', search_type={:?}",
        ctx.author().name,
        item,
        search_type
    );

    if item.trim().is_empty() {
        ctx.say("❌ Provide a pet name to search for.").await?;
        return Ok(());
    }
    let search_type: SearchType = match search_type.as_deref().unwrap_or("all").parse() {
        Ok(t) => t,
        Err(e) => {
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
    };

    ctx.defer_ephemeral().await?;
    let db_pool = &ctx.data().db_pool;
    let matches = query::search_classified(db_pool, item.trim(), search_type).await?;

    let offers: Vec<String> = matches
        .iter()
        .filter(|hit| hit.is_offer)
        .map(search_result_line)
        .collect();
    let requests: Vec<String> = matches
        .iter()
        .filter(|hit| hit.is_request)
        .map(search_result_line)
        .collect();

    let mut search_embed = serenity::CreateEmbed::default()
        .title(format!("Search Results for '{}'", item.trim()))
        .color(0x3498DB);

    let show_offers =
        matches!(search_type, SearchType::All | SearchType::Offers) && !offers.is_empty();
    let show_requests =
        matches!(search_type, SearchType::All | SearchType::Requests) && !requests.is_empty();

    if show_offers {
        search_embed = search_embed.field(
            format!("📦 Offers ({})", offers.len()),
            paginate_lines(&offers),
            false,
        );
    }
    if show_requests {
        search_embed = search_embed.field(
            format!("🔍 Requests ({})", requests.len()),
            paginate_lines(&requests),
            false,
        );
    }
    if !show_offers && !show_requests {
        search_embed =
            search_embed.description(format!("No listings found for '{}'", item.trim()));
    } else if let Some(first) = matches.first() {
        if let Some(url) = listing_thumbnail(db_pool, &first.listing).await? {
            search_embed = search_embed.thumbnail(url);
        }
    }

    ctx.send(
        poise::CreateReply::default()
            .embed(search_embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Edits one section of one of your listings.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn edit_listing(
    ctx: Context<'_>,
    #[description = "ID of the listing to edit"] listing_id: i64,
    #[description = "Section to edit: have or want"] section: String,
    #[description = "Pet to set quantities for"]
    #[autocomplete = "pet_name_autocomplete"]
    pet: String,
    #[description = "Quantities, e.g. 'Legendary:5, Mythic:3'"] quantities: String,
    #[description = "replace (default) or add to existing quantities"] mode: Option<String>,
) -> Result<()> {
    let author_id = ctx.author().id.get() as i64;
    info!(
        "Edit_listing from {} ({}): listing={}, section='{}', pet='{}', mode={:?}",
        ctx.author().name,
        author_id,
        listing_id,
        section,
        pet,
        mode
    );

    let db_pool = &ctx.data().db_pool;

    let Some(listing) = db::get_listing(db_pool, listing_id).await? else {
        ctx.say(format!("❌ Listing #{} not found.", listing_id))
            .await?;
        return Ok(());
    };
    if listing.owner != author_id {
        warn!(
            "User {} attempted to edit listing {} owned by {}. Denied.",
            author_id, listing_id, listing.owner
        );
        ctx.say("❌ You can only edit your own listings.").await?;
        return Ok(());
    }

    let section_lower = section.trim().to_lowercase();
    if section_lower != "have" && section_lower != "want" {
        ctx.say("❌ Section must be `have` or `want`.").await?;
        return Ok(());
    }
    let add_mode = match mode.as_deref().map(|m| m.trim().to_lowercase()) {
        None => false,
        Some(m) if m == "replace" => false,
        Some(m) if m == "add" => true,
        Some(other) => {
            ctx.say(format!("❌ Mode must be `replace` or `add`, not '{}'.", other))
                .await?;
            return Ok(());
        }
    };

    let Some(catalog_pet) = db::get_pet_by_name(db_pool, &pet).await? else {
        ctx.say(format!("❌ Pet '{}' not found in database.", pet))
            .await?;
        return Ok(());
    };

    let parsed: RarityQuantities = match parse_quantities(&quantities) {
        Ok(q) => q,
        Err(e) => {
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
    };

    // Build the updated section off the current listing state.
    let mut new_side = if section_lower == "have" {
        listing.haves.clone()
    } else {
        listing.wants.clone()
    };
    let entry = new_side.entry(catalog_pet.name.clone()).or_default();
    if add_mode {
        for (rarity, qty) in parsed {
            let combined = entry.get(&rarity).copied().unwrap_or(0).saturating_add(qty);
            if combined > MAX_QUANTITY {
                ctx.say(format!(
                    "❌ Adding {} would push {} ({}) past the {} per-rarity limit.",
                    qty, catalog_pet.name, rarity, MAX_QUANTITY
                ))
                .await?;
                return Ok(());
            }
            entry.insert(rarity, combined);
        }
    } else {
        *entry = parsed;
    }

    let (haves_ref, wants_ref) = if section_lower == "have" {
        (&new_side, &listing.wants)
    } else {
        (&listing.haves, &new_side)
    };
    if let Err(e) = ensure_listing_capacity(haves_ref, wants_ref) {
        ctx.say(e.user_message()).await?;
        return Ok(());
    }

    let args = if section_lower == "have" {
        UpdateListingArgs {
            haves: Some(&new_side),
            ..UpdateListingArgs::default()
        }
    } else {
        UpdateListingArgs {
            wants: Some(&new_side),
            ..UpdateListingArgs::default()
        }
    };
    db::update_listing(db_pool, listing_id, &args).await?;

    let action = if add_mode { "Added to" } else { "Replaced" };
    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ {} the **{}** section of listing #{}.\n**Updated {}:** {}",
                action,
                section_lower.to_uppercase(),
                listing_id,
                section_lower.to_uppercase(),
                format_pet_section(&new_side)
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Deletes one of your listings.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn delete_listing(
    ctx: Context<'_>,
    #[description = "ID of the listing to delete"] listing_id: i64,
) -> Result<()> {
    let author_id = ctx.author().id.get() as i64;
    info!(
        "Delete_listing from {} ({}): listing={}",
        ctx.author().name,
        author_id,
        listing_id
    );

    let db_pool = &ctx.data().db_pool;

    match db::get_listing(db_pool, listing_id).await? {
        Some(listing) if listing.owner != author_id => {
            warn!(
                "User {} attempted to delete listing {} owned by {}. Denied.",
                author_id, listing_id, listing.owner
            );
            ctx.say("❌ You can only delete your own listings.").await?;
        }
        Some(_) => {
            db::delete_listing(db_pool, listing_id).await?;
            ctx.say(format!("✅ Listing #{} has been deleted.", listing_id))
                .await?;
        }
        None => {
            // Deleting an absent listing is a no-op success.
            ctx.say(format!(
                "Listing #{} does not exist. Nothing to delete.",
                listing_id
            ))
            .await?;
        }
    }
    Ok(())
}
