//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord operator surface for Trickpoints, including all
//! slash commands, autocomplete handlers, and bot context management.

/// Discord command implementations (points, competition, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::economy::EconomyConfig,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info};

/// Shared data available to all bot commands.
/// This structure holds the database connection and the economy settings
/// that commands need to access.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Prize, reward and withdrawal settings
    pub economy: Arc<EconomyConfig>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(database: DatabaseConnection, economy: Arc<EconomyConfig>) -> Self {
        Self { database, economy }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_retryable() {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
            } else {
                info!("Command `{}` rejected: {error}", ctx.command().name);
            }
            if let Err(e) = ctx.say(error.user_message()).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework and runs the Discord client until it stops.
pub async fn run_bot(
    token: String,
    database: DatabaseConnection,
    economy: Arc<EconomyConfig>,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::balance(),
                commands::history(),
                commands::items(),
                commands::buy(),
                commands::withdraw(),
                commands::achievements(),
                commands::settle(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered {} commands", framework.options().commands.len());
                Ok(BotData::new(database, economy))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e}"))?;

    Ok(())
}
