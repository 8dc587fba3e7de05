//! Points Discord commands - `balance`, `history`, `items`, `buy` and `withdraw`.
//!
//! These commands go through the gateway and ledger modules; rejected operations
//! propagate as errors and are answered by the framework's error handler.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{gateway, ledger, market},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Shows your points balance and competition wins.
    #[poise::command(slash_command, prefix_command)]
    pub async fn balance(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();

        let (points, wins) = ledger::get_balance(db, &user_id)
            .await?
            .map_or((0, 0), |balance| (balance.total_points, balance.wins_count));

        ctx.say(format!("💰 You have **{points}** points and {wins} competition wins."))
            .await?;
        Ok(())
    }

    /// Lists your most recent ledger entries.
    #[poise::command(slash_command, prefix_command)]
    pub async fn history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "How many entries to show (default 10)"]
        #[min = 1]
        #[max = 50]
        limit: Option<u8>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();
        let limit = u64::from(limit.unwrap_or(10));

        let entries = ledger::get_recent_entries(db, &user_id, limit).await?;
        if entries.is_empty() {
            ctx.say("📭 No ledger entries yet.").await?;
            return Ok(());
        }

        let mut message = String::from("**Recent activity**\n");
        for entry in &entries {
            let _ = writeln!(
                message,
                "`#{}` {:+} ({:?}) {} → {}",
                entry.id,
                entry.points_change,
                entry.operation_kind,
                entry.description,
                entry.balance_after
            );
        }

        ctx.say(message).await?;
        Ok(())
    }

    /// Lists the items for sale.
    #[poise::command(slash_command, prefix_command)]
    pub async fn items(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let items = market::get_all_active_items(db).await?;

        if items.is_empty() {
            ctx.say("🛒 The market is empty.").await?;
            return Ok(());
        }

        let mut message = String::from("**Market**\n");
        for item in items {
            let _ = writeln!(
                message,
                "• {} - {} points ({} in stock)",
                item.name, item.price_points, item.stock
            );
        }

        ctx.say(message).await?;
        Ok(())
    }

    /// Buys an item from the market with points.
    #[poise::command(slash_command, prefix_command)]
    pub async fn buy(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to buy"]
        #[autocomplete = "autocomplete::autocomplete_item_name"]
        item_name: String,
        #[description = "Quantity (default 1)"] quantity: Option<i64>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();

        let item = market::get_item_by_name(db, &item_name)
            .await?
            .ok_or_else(|| Error::ItemNotFound {
                item: item_name.clone(),
            })?;

        let receipt = gateway::purchase(db, &user_id, item.id, quantity.unwrap_or(1)).await?;

        ctx.say(format!(
            "✅ Bought {}x {} for {} points. Balance: {} points.",
            receipt.purchase.quantity,
            receipt.item.name,
            receipt.purchase.total_points,
            receipt.new_balance
        ))
        .await?;
        Ok(())
    }

    /// Requests a payout of points.
    #[poise::command(slash_command, prefix_command)]
    pub async fn withdraw(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Points to withdraw"] amount: i64,
        #[description = "Payout method, e.g. card or crypto"] method: String,
        #[description = "Card number or wallet address"] destination: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let policy = &ctx.data().economy.withdrawal;
        let user_id = ctx.author().id.to_string();

        let request =
            gateway::request_withdrawal(db, policy, &user_id, amount, &method, &destination)
                .await?;

        ctx.say(format!(
            "🏦 Withdrawal #{} of {} points ({:.2} via {}) is pending review.",
            request.id, request.amount_points, request.payout_amount, request.payout_method
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
