//! Settlement entity - The recorded outcome of one competition period.
//!
//! A row's existence marks its period as settled. `period_date` is unique, so two
//! settlement runs racing on the same day cannot both commit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Settlement database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Competition day that was settled
    #[sea_orm(unique)]
    pub period_date: Date,
    /// Winning video
    pub video_id: i64,
    /// Author of the winning video
    pub user_id: String,
    /// Score that won
    pub score: f64,
    /// Points credited to the winner
    pub prize_points: i64,
    /// When the settlement committed
    pub settled_at: DateTimeUtc,
}

/// `Settlement` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
