//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't require any database operations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Trickpoints Help**\n\
        Here is a summary of all available commands.\n\n\
        **Points**\n\
        • `/balance` - Shows your points and competition wins.\n\
        • `/history [limit]` - Lists your most recent ledger entries.\n\
        • `/items` - Lists what the market sells.\n\
        • `/buy <item> [quantity]` - Buys a market item with points.\n\
        • `/withdraw <amount> <method> <destination>` - Requests a payout.\n\n\
        **Competition**\n\
        • `/achievements` - Shows your achievement progress.\n\
        • `/settle [date]` - Settles a competition day (owners only).\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
