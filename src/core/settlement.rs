//! Daily competition settlement - Picks each day's winning video and pays its author.
//!
//! A period is one UTC calendar day. Settling it marks the winner, records a settlement
//! row, credits the prize and bumps the author's win counter in one transaction. The
//! settlement row is both the "already settled" flag and, through its unique
//! `period_date`, the guard against two runs racing on the same day.
//!
//! The win-count achievement and the winner announcement run after commit. They are
//! soft-fail: a settled period stays settled even if either of them errors.

use crate::{
    config::economy::CompetitionSettings,
    core::{
        achievement::{self, Advance, CompletedAchievement},
        gateway, ledger, notification, scorer, video,
    },
    entities::{Settlement, settlement},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use sea_orm::{DatabaseConnection, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Ledger reason recorded on competition prizes
pub const PRIZE_REASON: &str = "competition_prize";

/// Result of settling one period.
#[derive(Debug, Clone, PartialEq)]
pub struct Winner {
    /// Settled day
    pub period_date: NaiveDate,
    /// Winning video
    pub video_id: i64,
    /// Its author
    pub user_id: String,
    /// Winning score
    pub score: f64,
    /// Points credited
    pub prize_points: i64,
    /// Author's balance after the prize
    pub new_balance: i64,
    /// Author's total wins including this one
    pub wins_count: i64,
    /// Win achievements completed by this settlement
    pub completed_achievements: Vec<CompletedAchievement>,
    /// Whether the announcement reached the outbox
    pub notification_enqueued: bool,
}

/// Payload of a winner announcement.
#[derive(Debug, Clone, Serialize)]
pub struct WinnerAnnouncement {
    /// Settled day
    pub period_date: NaiveDate,
    /// Winning video
    pub video_id: i64,
    /// Winning score
    pub score: f64,
    /// Points credited
    pub prize_points: i64,
}

/// The half-open UTC interval `[date 00:00, date+1 00:00)` a period covers.
#[must_use]
pub fn settlement_window(period_date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = period_date.and_time(NaiveTime::MIN).and_utc();
    (start, start + TimeDelta::days(1))
}

/// Returns the settlement of a period, if it ran.
pub async fn get_settlement<C>(db: &C, period_date: NaiveDate) -> Result<Option<settlement::Model>>
where
    C: ConnectionTrait,
{
    Settlement::find()
        .filter(settlement::Column::PeriodDate.eq(period_date))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whether a period has already been settled.
pub async fn is_settled<C>(db: &C, period_date: NaiveDate) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(get_settlement(db, period_date).await?.is_some())
}

/// Settles one competition period.
///
/// # Errors
/// * `AlreadySettled` if the period has a settlement, including one committed by a
///   concurrent run while this one was scoring
/// * `NoEligibleVideos` if no unsettled video was uploaded that day
///
/// Nothing is written on error.
pub async fn run<C>(db: &C, period_date: NaiveDate, settings: &CompetitionSettings) -> Result<Winner>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    if is_settled(&txn, period_date).await? {
        return Err(Error::AlreadySettled { date: period_date });
    }

    let (start, end) = settlement_window(period_date);
    let candidates = video::videos_in_window(&txn, start, end).await?;
    let Some(best) = scorer::select_winner(&candidates) else {
        return Err(Error::NoEligibleVideos { date: period_date });
    };
    let video_id = best.video.id;
    let user_id = best.video.user_id.clone();
    let score = best.score;

    if !video::mark_winner(&txn, video_id, period_date).await? {
        return Err(Error::AlreadySettled { date: period_date });
    }

    settlement::ActiveModel {
        period_date: Set(period_date),
        video_id: Set(video_id),
        user_id: Set(user_id.clone()),
        score: Set(score),
        prize_points: Set(settings.prize_points),
        settled_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::AlreadySettled { date: period_date },
        _ => Error::Database(e),
    })?;

    let prize = gateway::credit(
        &txn,
        &user_id,
        settings.prize_points,
        PRIZE_REASON,
        Some(video_id.to_string()),
    )
    .await?;
    let wins_count = ledger::record_win(&txn, &user_id).await?;

    txn.commit().await?;

    info!(
        %period_date,
        video_id,
        user_id = %user_id,
        score,
        prize = settings.prize_points,
        "competition period settled"
    );

    let completed_achievements =
        achievement::advance_or_log(db, &user_id, achievement::WINS, Advance::AtLeast(wins_count))
            .await;

    let announcement = WinnerAnnouncement {
        period_date,
        video_id,
        score,
        prize_points: settings.prize_points,
    };
    let notification_enqueued =
        match notification::enqueue(db, notification::WINNER_ANNOUNCEMENT, &user_id, &announcement)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id = %user_id, %period_date, error = %e, "winner announcement not enqueued");
                false
            }
        };

    Ok(Winner {
        period_date,
        video_id,
        user_id,
        score,
        prize_points: settings.prize_points,
        new_balance: prize.new_balance,
        wins_count,
        completed_achievements,
        notification_enqueued,
    })
}

/// Settles the UTC day before `now`.
pub async fn settle_yesterday<C>(
    db: &C,
    settings: &CompetitionSettings,
    now: DateTime<Utc>,
) -> Result<Winner>
where
    C: ConnectionTrait + TransactionTrait,
{
    let today = now.date_naive();
    let yesterday = today.pred_opt().ok_or_else(|| Error::Config {
        message: format!("no competition period before {today}"),
    })?;
    run(db, yesterday, settings).await
}

/// Starts a background task that settles yesterday on every tick.
///
/// An already settled or empty day is the normal steady state and only logged at debug.
pub fn spawn_daily_settlement(
    db: DatabaseConnection,
    settings: CompetitionSettings,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(settings.settlement_interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);

        loop {
            ticker.tick().await;
            match settle_yesterday(&db, &settings, Utc::now()).await {
                Ok(winner) => info!("{}", format_settlement_summary(&winner)),
                Err(e @ (Error::AlreadySettled { .. } | Error::NoEligibleVideos { .. })) => {
                    debug!(reason = %e, "nothing to settle");
                }
                Err(e) => error!(error = %e, "scheduled settlement failed"),
            }
        }
    })
}

/// One-line summary of a settlement for logs and operator replies.
#[must_use]
pub fn format_settlement_summary(winner: &Winner) -> String {
    let mut summary = format!(
        "Competition {} - video #{} by {} wins with score {:.1}, +{} points (balance {}, {} win{})",
        winner.period_date,
        winner.video_id,
        winner.user_id,
        winner.score,
        winner.prize_points,
        winner.new_balance,
        winner.wins_count,
        if winner.wins_count == 1 { "" } else { "s" },
    );

    if !winner.completed_achievements.is_empty() {
        let titles: Vec<&str> = winner
            .completed_achievements
            .iter()
            .map(|completed| completed.title.as_str())
            .collect();
        summary.push_str(&format!(" | unlocked: {}", titles.join(", ")));
    }

    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::OperationKind;
    use crate::test_utils::*;

    fn settings() -> CompetitionSettings {
        CompetitionSettings {
            prize_points: 1_000,
            settlement_interval_secs: 60,
        }
    }

    #[test]
    fn test_settlement_window() {
        let (start, end) = settlement_window(day(2024, 2, 28));
        assert_eq!(start, at(day(2024, 2, 28), 0, 0));
        assert_eq!(end, at(day(2024, 2, 29), 0, 0));
    }

    #[tokio::test]
    async fn test_first_seen_wins_tie() -> Result<()> {
        let db = setup_test_db().await?;
        let period = day(2024, 6, 1);

        // Scores 80, 70, 80 in upload order
        let first = create_test_video(&db, "alice", 10, 4.0, 100, at(period, 9, 0)).await?;
        create_test_video(&db, "bob", 5, 5.0, 50, at(period, 10, 0)).await?;
        create_test_video(&db, "carol", 10, 4.0, 100, at(period, 11, 0)).await?;

        let winner = run(&db, period, &settings()).await?;
        assert_eq!(winner.video_id, first.id);
        assert_eq!(winner.user_id, "alice");
        assert_eq!(winner.score, 80.0);
        assert_eq!(winner.new_balance, 1_000);
        assert_eq!(winner.wins_count, 1);

        let stored = video::get_video_by_id(&db, first.id).await?.unwrap();
        assert!(stored.is_winner);
        assert_eq!(stored.winner_date, Some(period));

        let entries = ledger::get_entries_for_user(&db, "alice").await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation_kind, OperationKind::Earned);
        assert_eq!(entries[0].description, PRIZE_REASON);
        assert_eq!(entries[0].reference_id, Some(first.id.to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_double_settlement_pays_once() -> Result<()> {
        let db = setup_test_db().await?;
        let period = day(2024, 6, 1);
        create_test_video(&db, "alice", 3, 4.0, 10, at(period, 12, 0)).await?;
        create_test_video(&db, "bob", 1, 1.0, 10, at(period, 13, 0)).await?;

        run(&db, period, &settings()).await?;
        let second = run(&db, period, &settings()).await;
        assert!(matches!(second, Err(Error::AlreadySettled { date }) if date == period));

        assert!(is_settled(&db, period).await?);
        let balance = ledger::get_balance(&db, "alice").await?.unwrap();
        assert_eq!(balance.total_points, 1_000);
        assert_eq!(balance.wins_count, 1);
        assert!(ledger::get_balance(&db, "bob").await?.is_none());
        assert_eq!(ledger::get_entries_for_user(&db, "alice").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_period_moves_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let period = day(2024, 6, 1);
        // Just outside the window on both sides
        create_test_video(&db, "alice", 50, 5.0, 1_000, at(day(2024, 5, 31), 23, 59)).await?;
        create_test_video(&db, "bob", 50, 5.0, 1_000, at(day(2024, 6, 2), 0, 0)).await?;

        let result = run(&db, period, &settings()).await;
        assert!(matches!(result, Err(Error::NoEligibleVideos { date }) if date == period));

        assert!(!is_settled(&db, period).await?);
        assert!(ledger::get_balance(&db, "alice").await?.is_none());
        assert!(video::get_winners(&db).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_wins_achievement_and_announcement() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_achievement(&db, "first_win", achievement::WINS, 1, 500).await?;
        let period = day(2024, 6, 1);
        let video = create_test_video(&db, "alice", 1, 1.0, 1, at(period, 8, 30)).await?;

        let winner = run(&db, period, &settings()).await?;
        assert_eq!(winner.completed_achievements.len(), 1);
        assert_eq!(winner.completed_achievements[0].code, "first_win");
        assert!(winner.notification_enqueued);

        let balance = ledger::get_balance(&db, "alice").await?.unwrap();
        assert_eq!(balance.total_points, 1_500);
        assert!(ledger::audit_balance(&db, "alice").await?.is_consistent());

        let queued = notification::pending(&db, 10).await?;
        let kinds: Vec<&str> = queued.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                notification::ACHIEVEMENT_COMPLETED,
                notification::WINNER_ANNOUNCEMENT
            ]
        );
        let announcement = &queued[1];
        assert_eq!(announcement.user_id, "alice");
        let payload: serde_json::Value = serde_json::from_str(&announcement.payload)?;
        assert_eq!(payload["video_id"], video.id);
        assert_eq!(payload["period_date"], "2024-06-01");

        Ok(())
    }

    #[tokio::test]
    async fn test_prize_stands_when_side_effects_fail() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_achievement(&db, "first_win", achievement::WINS, 1, 500).await?;
        let period = day(2024, 6, 1);
        let video = create_test_video(&db, "alice", 2, 3.0, 10, at(period, 14, 0)).await?;

        // Both post-commit steps will hit a missing table
        db.execute_unprepared("DROP TABLE achievement_progress")
            .await?;
        db.execute_unprepared("DROP TABLE notifications").await?;

        let winner = run(&db, period, &settings()).await?;
        assert_eq!(winner.video_id, video.id);
        assert!(winner.completed_achievements.is_empty());
        assert!(!winner.notification_enqueued);

        assert!(is_settled(&db, period).await?);
        let balance = ledger::get_balance(&db, "alice").await?.unwrap();
        assert_eq!(balance.total_points, 1_000);
        assert_eq!(balance.wins_count, 1);
        let entries = ledger::get_entries_for_user(&db, "alice").await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, PRIZE_REASON);

        Ok(())
    }

    #[tokio::test]
    async fn test_second_win_counts_up() -> Result<()> {
        let db = setup_test_db().await?;
        let first_day = day(2024, 6, 1);
        let second_day = day(2024, 6, 2);
        create_test_video(&db, "alice", 1, 1.0, 1, at(first_day, 8, 0)).await?;
        create_test_video(&db, "alice", 1, 1.0, 1, at(second_day, 8, 0)).await?;

        run(&db, first_day, &settings()).await?;
        let winner = run(&db, second_day, &settings()).await?;
        assert_eq!(winner.wins_count, 2);
        assert_eq!(winner.new_balance, 2_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_settle_yesterday() -> Result<()> {
        let db = setup_test_db().await?;
        let period = day(2024, 6, 1);
        create_test_video(&db, "alice", 1, 1.0, 1, at(period, 20, 0)).await?;

        let winner = settle_yesterday(&db, &settings(), at(day(2024, 6, 2), 0, 15)).await?;
        assert_eq!(winner.period_date, period);

        let summary = format_settlement_summary(&winner);
        assert!(summary.contains("2024-06-01"));
        assert!(summary.contains("alice"));
        assert!(summary.contains("+1000 points"));

        Ok(())
    }
}
