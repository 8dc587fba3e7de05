//! Achievement tracking - Per-category progress counters with one-time rewards.
//!
//! A category (e.g. `"likes"`, `"wins"`) groups one or more achievements with different
//! targets. Advancing a category touches every achievement in it, creating progress rows
//! on first contact. Crossing a target flips `is_completed` with a conditional update and
//! credits the reward in the same transaction; the flag is the exactly-once guard, so a
//! repeated or retried advance never pays twice.

use crate::{
    config::economy::AchievementConfig,
    core::{gateway, notification},
    entities::{Achievement, AchievementProgress, achievement, achievement_progress},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use tracing::{info, warn};

/// Ledger reason recorded on achievement rewards
pub const REWARD_REASON: &str = "achievement_completed";

/// Category advanced by uploads
pub const VIDEOS_UPLOADED: &str = "videos_uploaded";
/// Category advanced by likes received
pub const LIKES: &str = "likes";
/// Category set from the competition win counter
pub const WINS: &str = "wins";
/// Category advanced by completed tasks
pub const TASKS: &str = "tasks";

/// How to move a category's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Add to the current value (event-driven sources)
    Increment(i64),
    /// Raise to at least this value (absolute sources such as total wins)
    AtLeast(i64),
}

/// An achievement completed by an advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedAchievement {
    /// Achievement id
    pub achievement_id: i64,
    /// Configuration key
    pub code: String,
    /// Display title
    pub title: String,
    /// Points credited
    pub reward_points: i64,
    /// Progress value that completed it
    pub progress: i64,
}

/// A user's standing on one achievement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementStatus {
    /// The definition
    pub achievement: achievement::Model,
    /// Current counter, 0 if never touched
    pub current_progress: i64,
    /// Whether it has been completed
    pub is_completed: bool,
    /// When it completed
    pub completed_at: Option<DateTime<Utc>>,
}

/// Inserts missing definitions and refreshes changed ones, matching on `code`.
///
/// Returns the number of new definitions.
pub async fn seed_definitions<C>(db: &C, definitions: &[AchievementConfig]) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut inserted = 0;

    for definition in definitions {
        let existing = Achievement::find()
            .filter(achievement::Column::Code.eq(definition.code.as_str()))
            .one(db)
            .await?;

        if let Some(existing) = existing {
            let unchanged = existing.category == definition.category
                && existing.title == definition.title
                && existing.target_value == definition.target_value
                && existing.reward_points == definition.reward_points;
            if unchanged {
                continue;
            }
            let mut active: achievement::ActiveModel = existing.into();
            active.category = Set(definition.category.clone());
            active.title = Set(definition.title.clone());
            active.target_value = Set(definition.target_value);
            active.reward_points = Set(definition.reward_points);
            active.update(db).await?;
        } else {
            achievement::ActiveModel {
                code: Set(definition.code.clone()),
                category: Set(definition.category.clone()),
                title: Set(definition.title.clone()),
                target_value: Set(definition.target_value),
                reward_points: Set(definition.reward_points),
                ..Default::default()
            }
            .insert(db)
            .await?;
            inserted += 1;
        }
    }

    Ok(inserted)
}

async fn get_or_create_progress<C>(
    db: &C,
    user_id: &str,
    achievement_id: i64,
) -> Result<achievement_progress::Model>
where
    C: ConnectionTrait,
{
    let find = || {
        AchievementProgress::find()
            .filter(achievement_progress::Column::UserId.eq(user_id))
            .filter(achievement_progress::Column::AchievementId.eq(achievement_id))
    };

    if let Some(progress) = find().one(db).await? {
        return Ok(progress);
    }

    let fresh = achievement_progress::ActiveModel {
        user_id: Set(user_id.to_string()),
        achievement_id: Set(achievement_id),
        current_progress: Set(0),
        is_completed: Set(false),
        completed_at: Set(None),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    AchievementProgress::insert(fresh)
        .on_conflict(
            OnConflict::columns([
                achievement_progress::Column::UserId,
                achievement_progress::Column::AchievementId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    find()
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("achievement progress".to_string()).into())
}

/// Advances every achievement in `category` for a user.
///
/// Returns the achievements this call completed; already-completed ones keep counting
/// but are never returned or rewarded again.
///
/// # Errors
/// `InvalidAmount` for a negative increment, plus any ledger or database failure. On
/// error nothing is written.
pub async fn advance<C>(
    db: &C,
    user_id: &str,
    category: &str,
    mode: Advance,
) -> Result<Vec<CompletedAchievement>>
where
    C: ConnectionTrait + TransactionTrait,
{
    if let Advance::Increment(delta) = mode
        && delta < 0
    {
        return Err(Error::InvalidAmount { amount: delta });
    }

    let txn = db.begin().await?;

    let definitions = Achievement::find()
        .filter(achievement::Column::Category.eq(category))
        .order_by_asc(achievement::Column::TargetValue)
        .order_by_asc(achievement::Column::Id)
        .all(&txn)
        .await?;

    let mut completed = Vec::new();
    let now = Utc::now();

    for definition in definitions {
        let progress = get_or_create_progress(&txn, user_id, definition.id).await?;

        let new_value = match mode {
            Advance::Increment(delta) => progress.current_progress.saturating_add(delta),
            Advance::AtLeast(value) => progress.current_progress.max(value),
        };

        if new_value != progress.current_progress {
            let mut active: achievement_progress::ActiveModel = progress.clone().into();
            active.current_progress = Set(new_value);
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        if progress.is_completed || new_value < definition.target_value {
            continue;
        }

        let flipped = AchievementProgress::update_many()
            .col_expr(achievement_progress::Column::IsCompleted, Expr::value(true))
            .col_expr(achievement_progress::Column::CompletedAt, Expr::value(now))
            .filter(achievement_progress::Column::Id.eq(progress.id))
            .filter(achievement_progress::Column::IsCompleted.eq(false))
            .exec(&txn)
            .await?;
        if flipped.rows_affected == 0 {
            continue;
        }

        if definition.reward_points > 0 {
            gateway::credit(
                &txn,
                user_id,
                definition.reward_points,
                REWARD_REASON,
                Some(definition.id.to_string()),
            )
            .await?;
        }

        info!(
            user_id,
            code = %definition.code,
            reward = definition.reward_points,
            "achievement completed"
        );
        completed.push(CompletedAchievement {
            achievement_id: definition.id,
            code: definition.code,
            title: definition.title,
            reward_points: definition.reward_points,
            progress: new_value,
        });
    }

    txn.commit().await?;
    Ok(completed)
}

/// Adds `delta` to every achievement in the category.
pub async fn increment_category<C>(
    db: &C,
    user_id: &str,
    category: &str,
    delta: i64,
) -> Result<Vec<CompletedAchievement>>
where
    C: ConnectionTrait + TransactionTrait,
{
    advance(db, user_id, category, Advance::Increment(delta)).await
}

/// Raises every achievement in the category to at least `value`; never lowers progress.
pub async fn set_category_value<C>(
    db: &C,
    user_id: &str,
    category: &str,
    value: i64,
) -> Result<Vec<CompletedAchievement>>
where
    C: ConnectionTrait + TransactionTrait,
{
    advance(db, user_id, category, Advance::AtLeast(value)).await
}

/// Advances a category as a side effect of an operation that already committed.
///
/// Each completion is also queued as an `achievement_completed` notification. Failures
/// are logged and swallowed: a missed counter update must not fail the economic
/// operation that triggered it.
pub async fn advance_or_log<C>(
    db: &C,
    user_id: &str,
    category: &str,
    mode: Advance,
) -> Vec<CompletedAchievement>
where
    C: ConnectionTrait + TransactionTrait,
{
    let completed = match advance(db, user_id, category, mode).await {
        Ok(completed) => completed,
        Err(e) => {
            warn!(user_id, category, error = %e, "achievement advance failed");
            return Vec::new();
        }
    };

    for done in &completed {
        if let Err(e) =
            notification::enqueue(db, notification::ACHIEVEMENT_COMPLETED, user_id, done).await
        {
            warn!(user_id, code = %done.code, error = %e, "achievement notification not enqueued");
        }
    }

    completed
}

/// Every achievement with the user's standing, in category then target order.
pub async fn get_progress_for_user<C>(db: &C, user_id: &str) -> Result<Vec<AchievementStatus>>
where
    C: ConnectionTrait,
{
    let definitions = Achievement::find()
        .order_by_asc(achievement::Column::Category)
        .order_by_asc(achievement::Column::TargetValue)
        .all(db)
        .await?;

    let progress = AchievementProgress::find()
        .filter(achievement_progress::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    Ok(definitions
        .into_iter()
        .map(|definition| {
            let row = progress
                .iter()
                .find(|row| row.achievement_id == definition.id);
            AchievementStatus {
                current_progress: row.map_or(0, |row| row.current_progress),
                is_completed: row.is_some_and(|row| row.is_completed),
                completed_at: row.and_then(|row| row.completed_at),
                achievement: definition,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger;
    use crate::entities::OperationKind;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_negative_increment_rejected() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = increment_category(&db, "user1", LIKES, -1).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -1 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_completion_rewards_exactly_once() -> Result<()> {
        let db = setup_test_db().await?;
        let five_likes = create_test_achievement(&db, "likes_5", LIKES, 5, 100).await?;

        let completed = increment_category(&db, "user1", LIKES, 4).await?;
        assert!(completed.is_empty());

        // current=4, target=5: one more completes it
        let completed = increment_category(&db, "user1", LIKES, 1).await?;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].achievement_id, five_likes.id);
        assert_eq!(completed[0].progress, 5);

        // Repeated advance keeps counting but pays nothing
        let completed = increment_category(&db, "user1", LIKES, 1).await?;
        assert!(completed.is_empty());

        let status = get_progress_for_user(&db, "user1").await?;
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].current_progress, 6);
        assert!(status[0].is_completed);
        assert!(status[0].completed_at.is_some());

        let entries = ledger::get_entries_for_user(&db, "user1").await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].points_change, 100);
        assert_eq!(entries[0].operation_kind, OperationKind::Earned);
        assert_eq!(entries[0].description, REWARD_REASON);
        assert_eq!(entries[0].reference_id, Some(five_likes.id.to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_progress_row_created_once_per_achievement() -> Result<()> {
        let db = setup_test_db().await?;
        let badge = create_test_achievement(&db, "likes_3", LIKES, 3, 30).await?;

        let first = get_or_create_progress(&db, "user1", badge.id).await?;
        let second = get_or_create_progress(&db, "user1", badge.id).await?;
        assert_eq!(first.id, second.id);

        // A duplicate row for the same pair is refused by the schema
        let duplicate = achievement_progress::ActiveModel {
            user_id: Set("user1".to_string()),
            achievement_id: Set(badge.id),
            current_progress: Set(0),
            is_completed: Set(false),
            completed_at: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(duplicate.is_err());

        increment_category(&db, "user1", LIKES, 3).await?;
        let rows = AchievementProgress::find()
            .filter(achievement_progress::Column::UserId.eq("user1"))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(
            ledger::get_balance(&db, "user1").await?.unwrap().total_points,
            30
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_category_with_several_thresholds() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_achievement(&db, "uploads_1", VIDEOS_UPLOADED, 1, 10).await?;
        create_test_achievement(&db, "uploads_3", VIDEOS_UPLOADED, 3, 30).await?;
        create_test_achievement(&db, "likes_1", LIKES, 1, 5).await?;

        let completed = increment_category(&db, "user1", VIDEOS_UPLOADED, 1).await?;
        let codes: Vec<&str> = completed.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["uploads_1"]);

        let completed = increment_category(&db, "user1", VIDEOS_UPLOADED, 2).await?;
        let codes: Vec<&str> = completed.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["uploads_3"]);

        let balance = ledger::get_balance(&db, "user1").await?.unwrap();
        assert_eq!(balance.total_points, 40);

        // Other categories were not touched
        let status = get_progress_for_user(&db, "user1").await?;
        let likes = status
            .iter()
            .find(|s| s.achievement.code == "likes_1")
            .unwrap();
        assert_eq!(likes.current_progress, 0);
        assert!(!likes.is_completed);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_category_value_is_monotonic() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_achievement(&db, "wins_3", WINS, 3, 300).await?;

        assert!(set_category_value(&db, "user1", WINS, 2).await?.is_empty());
        // A stale absolute value never regresses progress
        assert!(set_category_value(&db, "user1", WINS, 1).await?.is_empty());
        let status = get_progress_for_user(&db, "user1").await?;
        assert_eq!(status[0].current_progress, 2);

        let completed = set_category_value(&db, "user1", WINS, 3).await?;
        assert_eq!(completed.len(), 1);

        // Duplicate delivery of the same absolute value is a no-op
        assert!(set_category_value(&db, "user1", WINS, 3).await?.is_empty());
        let balance = ledger::get_balance(&db, "user1").await?.unwrap();
        assert_eq!(balance.total_points, 300);

        Ok(())
    }

    #[tokio::test]
    async fn test_advance_or_log_enqueues_completions() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_achievement(&db, "tasks_2", TASKS, 2, 20).await?;

        assert!(advance_or_log(&db, "user1", TASKS, Advance::Increment(1)).await.is_empty());
        assert!(notification::pending(&db, 10).await?.is_empty());

        let completed = advance_or_log(&db, "user1", TASKS, Advance::Increment(1)).await;
        assert_eq!(completed.len(), 1);

        let queued = notification::pending(&db, 10).await?;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].kind, notification::ACHIEVEMENT_COMPLETED);
        assert_eq!(queued[0].user_id, "user1");
        let payload: serde_json::Value = serde_json::from_str(&queued[0].payload)?;
        assert_eq!(payload["code"], "tasks_2");
        assert_eq!(payload["reward_points"], 20);

        Ok(())
    }

    #[tokio::test]
    async fn test_advance_or_log_swallows_failures() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_achievement(&db, "tasks_1", TASKS, 1, 20).await?;
        db.execute_unprepared("DROP TABLE achievement_progress")
            .await?;

        assert!(advance_or_log(&db, "user1", TASKS, Advance::Increment(1)).await.is_empty());
        assert!(ledger::get_balance(&db, "user1").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_reward_completes_without_ledger_entry() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_achievement(&db, "badge_only", TASKS, 1, 0).await?;

        let completed = increment_category(&db, "user1", TASKS, 1).await?;
        assert_eq!(completed.len(), 1);
        assert!(ledger::get_entries_for_user(&db, "user1").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_category_is_noop() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(increment_category(&db, "user1", "skydives", 3).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_definitions_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let mut definitions = vec![AchievementConfig {
            code: "first_win".to_string(),
            category: WINS.to_string(),
            title: "First Win".to_string(),
            target_value: 1,
            reward_points: 500,
        }];

        assert_eq!(seed_definitions(&db, &definitions).await?, 1);
        assert_eq!(seed_definitions(&db, &definitions).await?, 0);

        definitions[0].reward_points = 750;
        assert_eq!(seed_definitions(&db, &definitions).await?, 0);

        let all = Achievement::find().all(&db).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].reward_points, 750);

        Ok(())
    }
}
