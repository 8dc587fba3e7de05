//! Achievement entity - Static achievement definitions.
//!
//! Definitions are seeded from `config.toml` and keyed by `code` so reseeding is
//! idempotent. Several achievements can share a category with different targets.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Achievement definition database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievements")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stable configuration key (e.g. `"wins_10"`)
    #[sea_orm(unique)]
    pub code: String,
    /// Progress category (e.g. `"likes"`, `"videos_uploaded"`, `"wins"`)
    pub category: String,
    /// Display title
    pub title: String,
    /// Progress value at which the achievement completes
    pub target_value: i64,
    /// Points credited once on completion
    pub reward_points: i64,
}

/// Defines relationships between Achievement and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One achievement has many per-user progress rows
    #[sea_orm(has_many = "super::achievement_progress::Entity")]
    Progress,
}

impl Related<super::achievement_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
