//! Shared test utilities for `Trickpoints`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{gateway, ledger, market, video},
    entities,
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Provisions a balance for `user_id`, seeded with one earned entry of `points`.
///
/// Zero points leaves the balance empty with no entries.
pub async fn create_test_user(
    db: &DatabaseConnection,
    user_id: &str,
    points: i64,
) -> Result<entities::user_balance::Model> {
    ledger::ensure_balance(db, user_id).await?;
    if points > 0 {
        gateway::credit(db, user_id, points, "test seed", None).await?;
    }
    ledger::get_balance(db, user_id)
        .await?
        .ok_or_else(|| crate::errors::Error::UnknownUser {
            user_id: user_id.to_string(),
        })
}

/// Stores a competition video with explicit metrics and upload time.
pub async fn create_test_video(
    db: &DatabaseConnection,
    user_id: &str,
    likes_count: i64,
    average_rating: f64,
    views: i64,
    created_at: DateTime<Utc>,
) -> Result<entities::competition_video::Model> {
    video::record_video(
        db,
        video::NewVideo {
            user_id: user_id.to_string(),
            likes_count,
            average_rating,
            views,
            created_at,
        },
    )
    .await
}

/// Creates a market item.
pub async fn create_test_item(
    db: &DatabaseConnection,
    name: &str,
    price_points: i64,
    stock: i64,
) -> Result<entities::market_item::Model> {
    market::create_item(db, name, price_points, stock).await
}

/// Creates an achievement definition; the title defaults to the code.
pub async fn create_test_achievement(
    db: &DatabaseConnection,
    code: &str,
    category: &str,
    target_value: i64,
    reward_points: i64,
) -> Result<entities::achievement::Model> {
    entities::achievement::ActiveModel {
        code: Set(code.to_string()),
        category: Set(category.to_string()),
        title: Set(code.to_string()),
        target_value: Set(target_value),
        reward_points: Set(reward_points),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Calendar date shorthand.
///
/// # Panics
/// On an invalid date.
#[allow(clippy::unwrap_used)]
pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// UTC instant on `date` at `hour:minute`.
///
/// # Panics
/// On an invalid time.
#[allow(clippy::unwrap_used)]
pub fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour, minute, 0).unwrap().and_utc()
}
