//! Competition video entity - The engagement metrics of a submitted video.
//!
//! Only the fields the scorer and settlement need are stored here; the media itself
//! lives with the upload pipeline.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Competition video database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "competition_videos")]
pub struct Model {
    /// Unique identifier for the video
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Author of the video
    pub user_id: String,
    /// Number of likes
    pub likes_count: i64,
    /// Average viewer rating, 0 to 5
    pub average_rating: f64,
    /// Number of views
    pub views: i64,
    /// Upload time, decides which settlement period the video competes in
    pub created_at: DateTimeUtc,
    /// Set once when the video wins its period
    pub is_winner: bool,
    /// The period the video won, never cleared
    pub winner_date: Option<Date>,
}

/// `CompetitionVideo` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
