//! Competition videos - Engagement metrics read at settlement and the winner write path.
//!
//! Uploads, likes and ratings arrive from the feed layer; this module records the
//! numbers the scorer needs and marks winners. A video is marked at most once.

use crate::{
    entities::{CompetitionVideo, competition_video},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// Metrics for a newly uploaded video.
#[derive(Debug, Clone)]
pub struct NewVideo {
    /// Author
    pub user_id: String,
    /// Likes at the time of recording
    pub likes_count: i64,
    /// Average rating, 0 to 5
    pub average_rating: f64,
    /// Views at the time of recording
    pub views: i64,
    /// Upload time
    pub created_at: DateTime<Utc>,
}

impl NewVideo {
    /// A fresh upload with no engagement yet.
    #[must_use]
    pub fn uploaded_now(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            likes_count: 0,
            average_rating: 0.0,
            views: 0,
            created_at: Utc::now(),
        }
    }
}

fn validate_metrics(likes_count: i64, average_rating: f64, views: i64) -> Result<()> {
    if likes_count < 0 {
        return Err(Error::InvalidMetrics {
            message: format!("likes cannot be negative, got {likes_count}"),
        });
    }
    if views < 0 {
        return Err(Error::InvalidMetrics {
            message: format!("views cannot be negative, got {views}"),
        });
    }
    if !(0.0..=5.0).contains(&average_rating) {
        return Err(Error::InvalidMetrics {
            message: format!("average rating must be between 0 and 5, got {average_rating}"),
        });
    }
    Ok(())
}

/// Stores a video's metrics.
pub async fn record_video<C>(db: &C, video: NewVideo) -> Result<competition_video::Model>
where
    C: ConnectionTrait,
{
    validate_metrics(video.likes_count, video.average_rating, video.views)?;

    competition_video::ActiveModel {
        user_id: Set(video.user_id),
        likes_count: Set(video.likes_count),
        average_rating: Set(video.average_rating),
        views: Set(video.views),
        created_at: Set(video.created_at),
        is_winner: Set(false),
        winner_date: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Retrieves a video by ID.
pub async fn get_video_by_id<C>(db: &C, video_id: i64) -> Result<Option<competition_video::Model>>
where
    C: ConnectionTrait,
{
    CompetitionVideo::find_by_id(video_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Adds one like to a video and returns the updated row.
pub async fn add_like<C>(db: &C, video_id: i64) -> Result<competition_video::Model>
where
    C: ConnectionTrait,
{
    let result = CompetitionVideo::update_many()
        .col_expr(
            competition_video::Column::LikesCount,
            Expr::col(competition_video::Column::LikesCount).add(1),
        )
        .filter(competition_video::Column::Id.eq(video_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::VideoNotFound { video_id });
    }

    get_video_by_id(db, video_id)
        .await?
        .ok_or(Error::VideoNotFound { video_id })
}

/// Overwrites the view count and rating reported by the feed.
pub async fn update_metrics<C>(
    db: &C,
    video_id: i64,
    views: i64,
    average_rating: f64,
) -> Result<competition_video::Model>
where
    C: ConnectionTrait,
{
    validate_metrics(0, average_rating, views)?;

    let mut video: competition_video::ActiveModel = get_video_by_id(db, video_id)
        .await?
        .ok_or(Error::VideoNotFound { video_id })?
        .into();
    video.views = Set(views);
    video.average_rating = Set(average_rating);
    video.update(db).await.map_err(Into::into)
}

/// Non-winning videos created in `[start, end)`, in upload order (ties by id).
///
/// This order is the scan order of settlement, so it decides score ties.
pub async fn videos_in_window<C>(
    db: &C,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<competition_video::Model>>
where
    C: ConnectionTrait,
{
    CompetitionVideo::find()
        .filter(competition_video::Column::CreatedAt.gte(start))
        .filter(competition_video::Column::CreatedAt.lt(end))
        .filter(competition_video::Column::IsWinner.eq(false))
        .order_by_asc(competition_video::Column::CreatedAt)
        .order_by_asc(competition_video::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a video as the winner of `period`.
///
/// Returns false without writing if the video had already won.
pub async fn mark_winner<C>(db: &C, video_id: i64, period: NaiveDate) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = CompetitionVideo::update_many()
        .col_expr(competition_video::Column::IsWinner, Expr::value(true))
        .col_expr(competition_video::Column::WinnerDate, Expr::value(period))
        .filter(competition_video::Column::Id.eq(video_id))
        .filter(competition_video::Column::IsWinner.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// All winning videos, most recent period first.
pub async fn get_winners<C>(db: &C) -> Result<Vec<competition_video::Model>>
where
    C: ConnectionTrait,
{
    CompetitionVideo::find()
        .filter(competition_video::Column::IsWinner.eq(true))
        .order_by_desc(competition_video::Column::WinnerDate)
        .all(db)
        .await
        .map_err(Into::into)
}
