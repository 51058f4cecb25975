use crate::config::AppConfig;
use crate::db::DbPool;
use crate::{commands, errors};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{info, instrument};

// User data, which is stored and accessible in all command invocations
#[derive(Debug)]
pub struct Data {
    pub app_config: Arc<AppConfig>,
    pub db_pool: DbPool,
}

// Type alias for the error type Poise will use
pub(crate) type Error = errors::Error;
pub(crate) type Context<'a> = poise::Context<'a, Data, Error>;

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            panic!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            // Storage and framework failures are logged in full but surfaced
            // as a generic line; input errors carry their own message.
            tracing::error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(error.user_message()).await {
                tracing::error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {}", e)
            }
        }
    }
}

#[instrument(skip(token, app_config, db_pool))]
pub async fn run_bot(
    token: String,
    app_config: Arc<AppConfig>,
    db_pool: DbPool,
) -> Result<(), serenity::Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::pets(),
                commands::create_listing(),
                commands::my_listings(),
                commands::search(),
                commands::edit_listing(),
                commands::delete_listing(),
                commands::record_trade(),
                commands::price_chart(),
                commands::market_overview(),
                commands::admin_listings(),
                commands::admin_delete_listing(),
                commands::admin_clear_user_listings(),
                commands::admin_edit_listing(),
                commands::admin_list(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data {
                    app_config: Arc::clone(&app_config),
                    db_pool,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES | serenity::GatewayIntents::DIRECT_MESSAGES;

    info!("Setting up Serenity client for Poise framework...");
    let client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await;

    match client {
        Ok(mut c) => {
            info!("Starting bot client...");
            if let Err(why) = c.start().await {
                tracing::error!("Client error: {:?}", why);
                return Err(why);
            }
        }
        Err(e) => {
            tracing::error!("Error creating client: {:?}", e);
            return Err(e);
        }
    }
    Ok(())
}
