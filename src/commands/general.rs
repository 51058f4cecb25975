use crate::bot::{Context, Error};
use crate::db;
use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

/// A simple ping command to check if the bot is responsive.
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    info!("Ping command received from user: {}", ctx.author().name);
    ctx.say("Pong!").await?;
    Ok(())
}

/// Shows a help guide covering the trading workflow.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    info!("Help command received from user: {}", ctx.author().name);

    let help_embed = serenity::CreateEmbed::default()
        .title("📖 Auction House Bot - Help Guide")
        .color(0x3498DB)
        .description("Learn how to trade pets effectively!")
        .field(
            "🎯 Quick Start",
            "1. `/create_listing` - List what you have or want\n\
             2. `/search <pet>` - Find other traders\n\
             3. `/my_listings` - Manage your listings\n\
             4. `/pets` - See all available pets",
            false,
        )
        .field(
            "📦 Creating Listings",
            "Use `/create_listing` with a pet name and quantities:\n\
             • **haves** - Pets you want to trade away\n\
             • **wants** - Pets you're looking for\n\n\
             Enter quantities like: `Legendary:5, Mythic:3`",
            false,
        )
        .field(
            "🔍 Searching",
            "Use `/search <pet>` to find listings:\n\
             • `search_type: all` - See offers and requests\n\
             • `search_type: offers` - Who's selling\n\
             • `search_type: requests` - Who's buying",
            false,
        )
        .field(
            "✏️ Managing Listings",
            "Use `/my_listings` to review what you've listed, then\n\
             `/edit_listing` to change a section or `/delete_listing` to remove one.",
            false,
        )
        .field(
            "💹 Price Tracking",
            "Record completed trades with `/record_trade`, then check\n\
             `/price_chart <pet>` or `/market_overview` for going rates.",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new("Happy trading! 🚀"));

    ctx.send(
        poise::CreateReply::default()
            .embed(help_embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Displays all pets available for listing.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn pets(ctx: Context<'_>) -> Result<(), Error> {
    info!("Pets command received from user: {}", ctx.author().name);
    let db_pool = &ctx.data().db_pool;

    let pets = db::get_all_pets(db_pool).await?;
    if pets.is_empty() {
        ctx.say("❌ No pets found in database.").await?;
        return Ok(());
    }

    let pet_list = pets
        .iter()
        .map(|pet| format!("• **{}**", pet.name))
        .collect::<Vec<_>>()
        .join("\n");

    let mut pets_embed = serenity::CreateEmbed::default()
        .title(format!("🐾 Available Pets ({})", pets.len()))
        .color(0x9B59B6)
        .description("Use these names in `/create_listing`")
        .field("Pet Names", pet_list, false)
        .footer(serenity::CreateEmbedFooter::new(
            "Tip: Use exact spelling from above",
        ));
    if let Some(first) = pets.first() {
        pets_embed = pets_embed.thumbnail(first.image_url.clone());
    }

    ctx.send(
        poise::CreateReply::default()
            .embed(pets_embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
