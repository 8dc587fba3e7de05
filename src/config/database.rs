//! Database configuration module for Trickpoints.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Creation uses `IF NOT EXISTS` and is safe
//! to run on every startup.

use crate::entities::{
    Achievement, AchievementProgress, CompetitionVideo, LedgerEntry, MarketItem, Notification,
    Purchase, Settlement, UserBalance, UserProfile, WithdrawalRequest, achievement_progress,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::{Index, TableCreateStatement},
};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/trickpoints.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to a
/// local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    statement
}

/// Creates all tables from the entity definitions.
///
/// Parents are created before children so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        table_for(&schema, UserBalance),
        table_for(&schema, LedgerEntry),
        table_for(&schema, UserProfile),
        table_for(&schema, CompetitionVideo),
        table_for(&schema, Settlement),
        table_for(&schema, Achievement),
        table_for(&schema, AchievementProgress),
        table_for(&schema, MarketItem),
        table_for(&schema, Purchase),
        table_for(&schema, WithdrawalRequest),
        table_for(&schema, Notification),
    ];

    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    // One progress row per (user, achievement); the completion flag relies on it.
    let progress_key = Index::create()
        .name("idx_achievement_progress_user_achievement")
        .table(AchievementProgress)
        .col(achievement_progress::Column::UserId)
        .col(achievement_progress::Column::AchievementId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&progress_key)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _ = UserBalance::find().limit(1).all(&db).await?;
        let _ = LedgerEntry::find().limit(1).all(&db).await?;
        let _ = CompetitionVideo::find().limit(1).all(&db).await?;
        let _ = Settlement::find().limit(1).all(&db).await?;
        let _ = AchievementProgress::find().limit(1).all(&db).await?;
        let _ = WithdrawalRequest::find().limit(1).all(&db).await?;
        let _ = Notification::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
