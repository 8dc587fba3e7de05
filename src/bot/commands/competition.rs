//! Competition Discord commands - `achievements` and the operator `settle` command.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{achievement, settlement},
        errors::{Error, Result},
    };
    use chrono::{NaiveDate, Utc};
    use std::fmt::Write;
    use tracing::info;

    /// Shows your achievement progress.
    #[poise::command(slash_command, prefix_command)]
    pub async fn achievements(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();

        let statuses = achievement::get_progress_for_user(db, &user_id).await?;
        if statuses.is_empty() {
            ctx.say("🏅 No achievements are configured.").await?;
            return Ok(());
        }

        let mut message = String::from("**Achievements**\n");
        for status in statuses {
            let mark = if status.is_completed { "✅" } else { "▫️" };
            let _ = writeln!(
                message,
                "{mark} {} - {}/{} ({} points)",
                status.achievement.title,
                status.current_progress.min(status.achievement.target_value),
                status.achievement.target_value,
                status.achievement.reward_points
            );
        }

        ctx.say(message).await?;
        Ok(())
    }

    /// Settles a competition day and pays its winner.
    ///
    /// Defaults to yesterday (UTC). Settling a day twice is refused.
    #[poise::command(slash_command, prefix_command, owners_only)]
    pub async fn settle(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Day to settle as YYYY-MM-DD (default yesterday)"] date: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let settings = &ctx.data().economy.competition;

        let winner = match date {
            Some(raw) => {
                let Ok(period) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") else {
                    ctx.say(format!("❌ `{raw}` is not a date. Use YYYY-MM-DD."))
                        .await?;
                    return Ok(());
                };
                settlement::run(db, period, settings).await?
            }
            None => settlement::settle_yesterday(db, settings, Utc::now()).await?,
        };

        info!(operator = %ctx.author().id, period = %winner.period_date, "manual settlement");
        ctx.say(format!(
            "🏆 {}",
            settlement::format_settlement_summary(&winner)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
