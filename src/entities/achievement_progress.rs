//! Achievement progress entity - Per-user progress toward one achievement.
//!
//! Rows are created on the first advance of their category and never deleted.
//! `is_completed` only ever moves from false to true; it guards the one-time reward.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Achievement progress database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievement_progress")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User the progress belongs to
    pub user_id: String,
    /// Achievement being tracked
    pub achievement_id: i64,
    /// Current counter value
    pub current_progress: i64,
    /// Whether the target has been reached and rewarded
    pub is_completed: bool,
    /// When the achievement completed
    pub completed_at: Option<DateTimeUtc>,
    /// When the counter last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `AchievementProgress` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each progress row tracks one achievement
    #[sea_orm(
        belongs_to = "super::achievement::Entity",
        from = "Column::AchievementId",
        to = "super::achievement::Column::Id"
    )]
    Achievement,
}

impl Related<super::achievement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Achievement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
