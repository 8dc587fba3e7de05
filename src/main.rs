use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trickpoints::{
    bot,
    config::{database, economy},
    core::{achievement, settlement},
    errors::{Error, Result},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the economy configuration
    let economy = economy::load_default_config()
        .inspect_err(|e| error!("Failed to load economy configuration: {e}"))?;
    info!(
        prize_points = economy.competition.prize_points,
        achievements = economy.achievements.len(),
        "Economy configuration loaded"
    );

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed the achievement catalogue
    let seeded = achievement::seed_definitions(&db, &economy.achievements).await?;
    info!("Seeded {seeded} new achievement definitions");

    // 6. Start the daily settlement task on its own connection
    let economy = Arc::new(economy);
    let settlement_db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to open settlement connection: {e}"))?;
    let _settlement_task =
        settlement::spawn_daily_settlement(settlement_db, economy.competition.clone());

    // 7. Run the bot; the token is read directly before use
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, db, economy).await
}
