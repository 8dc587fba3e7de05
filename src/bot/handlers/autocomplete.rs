//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::market, errors::Error};

/// Suggests active market item names containing `partial`, case-insensitively.
///
/// Returns at most 25 names, the Discord autocomplete limit, sorted alphabetically.
/// A database failure yields no suggestions.
pub async fn autocomplete_item_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(items) = market::get_all_active_items(db).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();

    // Return just the name so it matches the command parameter exactly
    let mut matching: Vec<String> = items
        .into_iter()
        .filter(|item| item.name.to_lowercase().contains(&partial_lower))
        .map(|item| item.name)
        .take(25)
        .collect();

    matching.sort();
    matching
}
