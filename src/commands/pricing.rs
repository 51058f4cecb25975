use crate::bot::{Context, Error};
use crate::commands::utils::pet_name_autocomplete;
use crate::db::{self, DbPool, RecordTradeArgs};
use crate::errors::Result;
use crate::models::Rarity;
use crate::pricing::summarize_prices;
use crate::validate::validate_quantity;
use chrono::{Duration, Utc};
use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

/// Parses a `"Pet Rarity Qty"` triple (the trade-recording input format)
/// and resolves the pet against the catalog.
async fn parse_trade_side(pool: &DbPool, raw: &str) -> Result<(String, Rarity, u32)> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    let &[pet_name, rarity_str, qty_str] = parts.as_slice() else {
        return Err(Error::Validation(format!(
            "Invalid format: '{}'. Use 'Pet Rarity Quantity' (e.g., 'Aurelia Legendary 10')",
            raw.trim()
        )));
    };

    let pet = db::get_pet_by_name(pool, pet_name)
        .await?
        .ok_or_else(|| {
            Error::Validation(format!(
                "Pet '{}' not found in database. Use `/pets` to see available pets.",
                pet_name
            ))
        })?;
    let rarity: Rarity = rarity_str.parse()?;
    let qty = validate_quantity(qty_str)?;
    if qty == 0 {
        return Err(Error::Validation("Quantity must be at least 1".to_string()));
    }
    Ok((pet.name, rarity, qty))
}

/// Records a completed trade for price tracking.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn record_trade(
    ctx: Context<'_>,
    #[description = "Pet you gave: 'Pet Rarity Qty', e.g. 'Aurelia Legendary 10'"] gave: String,
    #[description = "Pet you received: 'Pet Rarity Qty', e.g. 'Bramble Mythic 5'"] received: String,
) -> Result<()> {
    let user_id = ctx.author().id.get() as i64;
    info!(
        "Record_trade from {} ({}): gave='{}', received='{}'",
        ctx.author().name,
        user_id,
        gave,
        received
    );

    let db_pool = &ctx.data().db_pool;

    let (gave_pet, gave_rarity, gave_qty) = match parse_trade_side(db_pool, &gave).await {
        Ok(side) => side,
        Err(e @ Error::Validation(_)) => {
            ctx.say(e.user_message()).await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let (received_pet, received_rarity, received_qty) =
        match parse_trade_side(db_pool, &received).await {
            Ok(side) => side,
            Err(e @ Error::Validation(_)) => {
                ctx.say(e.user_message()).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

    let trade_id = db::record_trade(
        db_pool,
        &RecordTradeArgs {
            user_id,
            gave_pet: &gave_pet,
            gave_qty,
            gave_rarity,
            received_pet: &received_pet,
            received_qty,
            received_rarity,
        },
    )
    .await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ Trade recorded! (ID: {})\n\n\
                 **You gave:** {}x {} ({})\n\
                 **You received:** {}x {} ({})\n\n\
                 Use `/price_chart` to view average prices!",
                trade_id, gave_qty, gave_pet, gave_rarity, received_qty, received_pet,
                received_rarity
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Shows average trade prices for a pet over recent days.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn price_chart(
    ctx: Context<'_>,
    #[description = "Pet name to check prices for"]
    #[autocomplete = "pet_name_autocomplete"]
    pet: String,
    #[description = "Days to look back (default 30)"] days: Option<u32>,
) -> Result<()> {
    let days = days.unwrap_or(30);
    info!(
        "Price_chart from {}: pet='{}', days={}",
        ctx.author().name,
        pet,
        days
    );

    if !(1..=365).contains(&days) {
        ctx.say("❌ Days must be between 1 and 365").await?;
        return Ok(());
    }

    let db_pool = &ctx.data().db_pool;
    let cutoff = Utc::now() - Duration::days(i64::from(days));
    let trades = db::get_trades_where_gave(db_pool, &pet, cutoff).await?;
    let summary = summarize_prices(&pet, days, &trades);

    if summary.total_trades == 0 {
        ctx.say(format!(
            "📊 No trades recorded for **{}** in the last {} days.",
            pet, days
        ))
        .await?;
        return Ok(());
    }

    let mut chart_embed = serenity::CreateEmbed::default()
        .title(format!("💹 Price Chart - {}", summary.pet_name))
        .color(0xF1C40F)
        .description(format!(
            "Average trade prices over the last {} days\n**Total Trades: {}**",
            summary.days, summary.total_trades
        ));
    for (rarity, price) in &summary.by_rarity {
        chart_embed = chart_embed.field(
            format!("{} Rarity", rarity),
            format!(
                "**Average Price:** {}\n**Trades:** {}",
                price.price_text, price.trade_count
            ),
            false,
        );
    }
    chart_embed = chart_embed.footer(serenity::CreateEmbedFooter::new(
        "Based on recorded trades - submit your trades with /record_trade!",
    ));

    ctx.send(
        poise::CreateReply::default()
            .embed(chart_embed)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Shows trade activity across all pets.
#[poise::command(slash_command)]
#[instrument(skip(ctx))]
pub async fn market_overview(
    ctx: Context<'_>,
    #[description = "Days to look back (default 30)"] days: Option<u32>,
) -> Result<()> {
    let days = days.unwrap_or(30);
    info!(
        "Market_overview from {}: days={}",
        ctx.author().name,
        days
    );

    if !(1..=365).contains(&days) {
        ctx.say("❌ Days must be between 1 and 365").await?;
        return Ok(());
    }

    ctx.defer_ephemeral().await?;
    let db_pool = &ctx.data().db_pool;
    let cutoff = Utc::now() - Duration::days(i64::from(days));

    let mut market_data = Vec::new();
    for pet in db::get_all_pets(db_pool).await? {
        let trades = db::get_trades_where_gave(db_pool, &pet.name, cutoff).await?;
        if !trades.is_empty() {
            market_data.push((pet.name, trades.len()));
        }
    }

    let mut overview_embed = serenity::CreateEmbed::default()
        .title("📈 Market Overview")
        .color(0x5865F2)
        .description(format!(
            "Trade activity overview for the last {} days",
            days
        ));

    if market_data.is_empty() {
        overview_embed = overview_embed.description(format!(
            "No trades recorded in the last {} days. Start recording trades with `/record_trade`!",
            days
        ));
    } else {
        // Most active pets first, top 10.
        market_data.sort_by(|a, b| b.1.cmp(&a.1));
        for (rank, (pet_name, trade_count)) in market_data.iter().take(10).enumerate() {
            overview_embed = overview_embed.field(
                format!("{}. {}", rank + 1, pet_name),
                format!("**{}** trades", trade_count),
                true,
            );
        }
    }
    overview_embed =
        overview_embed.footer(serenity::CreateEmbedFooter::new("Most traded pets appear first"));

    ctx.send(poise::CreateReply::default().embed(overview_embed))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{direct_insert_pet, setup_test_db};

    #[tokio::test]
    async fn test_parse_trade_side() -> Result<()> {
        let pool = setup_test_db().await?;
        {
            let conn = pool.lock().unwrap();
            direct_insert_pet(&conn, "Aurelia", "https://example.com/aurelia.webp")?;
        }

        let (pet, rarity, qty) = parse_trade_side(&pool, "aurelia legendary 10").await?;
        assert_eq!(pet, "Aurelia"); // canonical catalog spelling
        assert_eq!(rarity, Rarity::Legendary);
        assert_eq!(qty, 10);

        // Wrong arity, unknown pet, bad rarity, bad quantity.
        assert!(parse_trade_side(&pool, "Aurelia Legendary").await.is_err());
        assert!(parse_trade_side(&pool, "Nobody Legendary 5").await.is_err());
        assert!(parse_trade_side(&pool, "Aurelia Common 5").await.is_err());
        assert!(parse_trade_side(&pool, "Aurelia Legendary zero").await.is_err());
        assert!(parse_trade_side(&pool, "Aurelia Legendary 0").await.is_err());
        Ok(())
    }
}
