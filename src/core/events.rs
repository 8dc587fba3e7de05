//! Engagement events - Entry points for likes, uploads and completed tasks.
//!
//! Each handler commits its financial step first and fails if that step fails. The
//! achievement counter is advanced afterwards through
//! [`achievement::advance_or_log`], so a counter failure is logged and never rolls back
//! points that were already credited.

use crate::{
    config::economy::RewardSettings,
    core::{
        achievement::{self, Advance, CompletedAchievement},
        gateway,
        ledger::AppendOutcome,
        video::{self, NewVideo},
    },
    entities::competition_video,
    errors::Result,
};
use sea_orm::{ConnectionTrait, TransactionTrait};

/// Ledger reason for like rewards
pub const LIKE_REASON: &str = "like_received";
/// Ledger reason for upload rewards
pub const UPLOAD_REASON: &str = "video_uploaded";
/// Ledger reason for task rewards
pub const TASK_REASON: &str = "task_completed";

/// What an event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    /// The ledger append, if the event paid anything
    pub credited: Option<AppendOutcome>,
    /// Achievements the event completed
    pub completed_achievements: Vec<CompletedAchievement>,
}

/// Records a like on a video and rewards its author.
///
/// # Errors
/// `VideoNotFound` if the video does not exist; nothing is written in that case.
pub async fn on_like_received<C>(
    db: &C,
    rewards: &RewardSettings,
    video_id: i64,
) -> Result<(competition_video::Model, EventOutcome)>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let liked = video::add_like(&txn, video_id).await?;
    let credited = if rewards.like_points > 0 {
        Some(
            gateway::credit(
                &txn,
                &liked.user_id,
                rewards.like_points,
                LIKE_REASON,
                Some(video_id.to_string()),
            )
            .await?,
        )
    } else {
        None
    };
    txn.commit().await?;

    let completed_achievements =
        achievement::advance_or_log(db, &liked.user_id, achievement::LIKES, Advance::Increment(1))
            .await;

    Ok((
        liked,
        EventOutcome {
            credited,
            completed_achievements,
        },
    ))
}

/// Records an uploaded video and applies the upload reward, if one is configured.
pub async fn on_video_uploaded<C>(
    db: &C,
    rewards: &RewardSettings,
    upload: NewVideo,
) -> Result<(competition_video::Model, EventOutcome)>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let stored = video::record_video(&txn, upload).await?;
    let credited = if rewards.video_upload_points > 0 {
        Some(
            gateway::credit(
                &txn,
                &stored.user_id,
                rewards.video_upload_points,
                UPLOAD_REASON,
                Some(stored.id.to_string()),
            )
            .await?,
        )
    } else {
        None
    };
    txn.commit().await?;

    let completed_achievements = achievement::advance_or_log(
        db,
        &stored.user_id,
        achievement::VIDEOS_UPLOADED,
        Advance::Increment(1),
    )
    .await;

    Ok((
        stored,
        EventOutcome {
            credited,
            completed_achievements,
        },
    ))
}

/// Pays the reward for a completed task, referencing the task id.
///
/// # Errors
/// `InvalidAmount` unless `reward_points > 0`.
pub async fn on_task_completed<C>(
    db: &C,
    user_id: &str,
    task_id: &str,
    reward_points: i64,
) -> Result<EventOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    let credited = gateway::credit(
        db,
        user_id,
        reward_points,
        TASK_REASON,
        Some(task_id.to_string()),
    )
    .await?;

    let completed_achievements =
        achievement::advance_or_log(db, user_id, achievement::TASKS, Advance::Increment(1)).await;

    Ok(EventOutcome {
        credited: Some(credited),
        completed_achievements,
    })
}
