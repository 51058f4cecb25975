use crate::bot::{Context, Error};
use crate::commands::utils::format_pet_section;
use crate::db::{self, UpdateListingArgs};
use crate::models::PetQuantities;
use crate::validate::ensure_listing_capacity;
use poise::serenity_prelude as serenity;
use tracing::{info, instrument, warn};

/// Checks the config admin list and replies with a denial if the author is
/// not on it. The list is loaded once at startup; there is no runtime
/// mutation of admin membership.
async fn ensure_admin(ctx: &Context<'_>) -> Result<bool, Error> {
    let author_id = ctx.author().id.get();
    if ctx.data().app_config.is_admin(author_id) {
        return Ok(true);
    }
    warn!(
        "User {} ({}) attempted an admin command without permission.",
        ctx.author().name,
        author_id
    );
    ctx.say("❌ You don't have permission to use this command.")
        .await?;
    Ok(false)
}

/// Shows every listing in the store (admin only).
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn admin_listings(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_admin(&ctx).await? {
        return Ok(());
    }
    info!("Admin_listings from {}", ctx.author().name);

    let db_pool = &ctx.data().db_pool;
    let listings = db::get_all_listings(db_pool).await?;

    if listings.is_empty() {
        ctx.say("📋 No listings in the database.").await?;
        return Ok(());
    }

    let embed_fields: Vec<(String, String, bool)> = listings
        .iter()
        .take(25)
        .map(|listing| {
            (
                format!("ID #{} | User {}", listing.id, listing.owner),
                format!(
                    "**Have:** {}\n**Want:** {}\n**Desc:** {}",
                    format_pet_section(&listing.haves),
                    format_pet_section(&listing.wants),
                    listing.description.as_deref().unwrap_or("N/A")
                ),
                false,
            )
        })
        .collect();

    let mut admin_embed = serenity::CreateEmbed::default()
        .title(format!("📋 All Listings ({} total)", listings.len()))
        .color(0xF1C40F)
        .description("Admin view - showing all user listings")
        .fields(embed_fields);
    if listings.len() > 25 {
        admin_embed = admin_embed.footer(serenity::CreateEmbedFooter::new(format!(
            "Showing first 25 of {} listings",
            listings.len()
        )));
    }

    ctx.send(
        poise::CreateReply::default()
            .embed(admin_embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Deletes any listing by ID (admin only).
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn admin_delete_listing(
    ctx: Context<'_>,
    #[description = "The listing ID to delete"] listing_id: i64,
) -> Result<(), Error> {
    if !ensure_admin(&ctx).await? {
        return Ok(());
    }

    let db_pool = &ctx.data().db_pool;
    let deleted = db::delete_listing(db_pool, listing_id).await?;
    if deleted {
        info!(
            "Admin {} deleted listing {}",
            ctx.author().id.get(),
            listing_id
        );
        ctx.say(format!("✅ Listing #{} deleted!", listing_id))
            .await?;
    } else {
        ctx.say(format!("❌ Listing #{} not found.", listing_id))
            .await?;
    }
    Ok(())
}

/// Deletes all listings from a user (admin only).
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn admin_clear_user_listings(
    ctx: Context<'_>,
    #[description = "The Discord user ID to clear listings for"] user_id: String,
) -> Result<(), Error> {
    if !ensure_admin(&ctx).await? {
        return Ok(());
    }

    let Ok(owner) = user_id.trim().parse::<i64>() else {
        ctx.say(format!("❌ '{}' is not a valid user ID.", user_id))
            .await?;
        return Ok(());
    };

    let db_pool = &ctx.data().db_pool;
    let count = db::delete_user_listings(db_pool, owner).await?;
    if count == 0 {
        ctx.say(format!("❌ No listings found for user {}.", owner))
            .await?;
    } else {
        info!(
            "Admin {} deleted {} listings from user {}",
            ctx.author().id.get(),
            count,
            owner
        );
        ctx.say(format!("✅ Deleted {} listing(s) from user {}!", count, owner))
            .await?;
    }
    Ok(())
}

/// Edits any listing directly with JSON section values (admin only).
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn admin_edit_listing(
    ctx: Context<'_>,
    #[description = "The listing ID to edit"] listing_id: i64,
    #[description = "New HAVE section (JSON format)"] haves: Option<String>,
    #[description = "New WANT section (JSON format)"] wants: Option<String>,
) -> Result<(), Error> {
    if !ensure_admin(&ctx).await? {
        return Ok(());
    }

    let db_pool = &ctx.data().db_pool;
    let Some(current) = db::get_listing(db_pool, listing_id).await? else {
        ctx.say(format!("❌ Listing #{} not found.", listing_id))
            .await?;
        return Ok(());
    };

    let parse_json = |raw: &str| -> Result<PetQuantities, serde_json::Error> {
        serde_json::from_str(raw)
    };
    let new_haves = match haves.as_deref().map(parse_json).transpose() {
        Ok(parsed) => parsed,
        Err(_) => {
            ctx.say("❌ Invalid JSON format. Use: `{\"PetName\": {\"Rarity\": quantity}}`")
                .await?;
            return Ok(());
        }
    };
    let new_wants = match wants.as_deref().map(parse_json).transpose() {
        Ok(parsed) => parsed,
        Err(_) => {
            ctx.say("❌ Invalid JSON format. Use: `{\"PetName\": {\"Rarity\": quantity}}`")
                .await?;
            return Ok(());
        }
    };

    // The capacity cap still applies to admin edits.
    let haves_ref = new_haves.as_ref().unwrap_or(&current.haves);
    let wants_ref = new_wants.as_ref().unwrap_or(&current.wants);
    if let Err(e) = ensure_listing_capacity(haves_ref, wants_ref) {
        ctx.say(e.user_message()).await?;
        return Ok(());
    }

    db::update_listing(
        db_pool,
        listing_id,
        &UpdateListingArgs {
            haves: new_haves.as_ref(),
            wants: new_wants.as_ref(),
            ..UpdateListingArgs::default()
        },
    )
    .await?;

    info!(
        "Admin {} edited listing {}",
        ctx.author().id.get(),
        listing_id
    );
    ctx.say(format!(
        "✅ Listing #{} updated!\n\n**Have:** {}\n**Want:** {}",
        listing_id,
        format_pet_section(haves_ref),
        format_pet_section(wants_ref)
    ))
    .await?;
    Ok(())
}

/// Shows the configured admins (admin only).
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn admin_list(ctx: Context<'_>) -> Result<(), Error> {
    if !ensure_admin(&ctx).await? {
        return Ok(());
    }

    let admins = &ctx.data().app_config.admin_user_ids;
    let admin_lines = admins
        .iter()
        .map(|admin_id| format!("• <@{}>", admin_id))
        .collect::<Vec<_>>()
        .join("\n");

    let list_embed = serenity::CreateEmbed::default()
        .title("👨‍💼 Current Admins")
        .color(0xF1C40F)
        .description(format!(
            "Total: **{}** admin(s) (configured in config.toml)\n\n{}",
            admins.len(),
            admin_lines
        ));

    ctx.send(
        poise::CreateReply::default()
            .embed(list_embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
