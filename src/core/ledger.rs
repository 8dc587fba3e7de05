//! Ledger business logic - The append-only points ledger and materialized balances.
//!
//! Every balance change is an immutable entry. The entry insert and the balance update
//! run in one database transaction, so the balance never disagrees with the sum of its
//! entries. The balance update is a single conditional statement
//! (`total_points = total_points + delta WHERE total_points >= -delta`), which is what
//! serializes concurrent spends against the same user.

use crate::{
    entities::{LedgerEntry, OperationKind, UserBalance, ledger_entry, user_balance},
    errors::{Error, Result},
};
use sea_orm::{
    QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;

/// Result of appending one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// The entry that was written
    pub entry: ledger_entry::Model,
    /// Balance after the entry was applied
    pub new_balance: i64,
}

/// Materialized balance compared against the ledger it is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAudit {
    /// Sum of every entry for the user
    pub ledger_sum: i64,
    /// `total_points` on the balance row
    pub materialized: i64,
}

impl BalanceAudit {
    /// Whether the balance row matches its ledger.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.ledger_sum == self.materialized
    }
}

/// Returns the balance row for a user, creating a zero balance if none exists.
///
/// Safe to call repeatedly and concurrently: the insert ignores an existing row.
pub async fn ensure_balance<C>(db: &C, user_id: &str) -> Result<user_balance::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = UserBalance::find_by_id(user_id.to_string()).one(db).await? {
        return Ok(existing);
    }

    let balance = user_balance::ActiveModel {
        user_id: Set(user_id.to_string()),
        total_points: Set(0),
        wins_count: Set(0),
        updated_at: Set(chrono::Utc::now()),
    };
    UserBalance::insert(balance)
        .on_conflict(
            OnConflict::column(user_balance::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    debug!(user_id, "provisioned zero balance");

    UserBalance::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::UnknownUser {
            user_id: user_id.to_string(),
        })
}

/// Retrieves a user's balance row, None if the user has never been seen.
pub async fn get_balance<C>(db: &C, user_id: &str) -> Result<Option<user_balance::Model>>
where
    C: ConnectionTrait,
{
    UserBalance::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Appends a signed entry and applies it to the user's balance atomically.
///
/// # Arguments
/// * `db` - Connection or an enclosing transaction (a savepoint is used in that case)
/// * `user_id` - Owner of the balance
/// * `points_change` - Signed change, must not be zero
/// * `kind` - Operation kind recorded on the entry
/// * `description` - Human-readable reason
/// * `reference_id` - Originating object, if any
///
/// # Errors
/// * `UnknownUser` if no balance row exists
/// * `InsufficientBalance` if a negative change would take the balance below zero
/// * `InvalidAmount` if `points_change` is zero or `i64::MIN`
pub async fn append_entry<C>(
    db: &C,
    user_id: &str,
    points_change: i64,
    kind: OperationKind,
    description: &str,
    reference_id: Option<String>,
) -> Result<AppendOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    // Zero and i64::MIN are rejected.
    let required = match points_change.checked_neg() {
        Some(negated) if points_change != 0 => negated,
        _ => {
            return Err(Error::InvalidAmount {
                amount: points_change,
            });
        }
    };

    let txn = db.begin().await?;

    let current = UserBalance::find_by_id(user_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::UnknownUser {
            user_id: user_id.to_string(),
        })?;

    let now = chrono::Utc::now();
    let mut update = UserBalance::update_many()
        .col_expr(
            user_balance::Column::TotalPoints,
            Expr::col(user_balance::Column::TotalPoints).add(points_change),
        )
        .col_expr(user_balance::Column::UpdatedAt, Expr::value(now))
        .filter(user_balance::Column::UserId.eq(user_id));
    if points_change < 0 {
        update = update.filter(user_balance::Column::TotalPoints.gte(required));
    }

    if update.exec(&txn).await?.rows_affected == 0 {
        return Err(Error::InsufficientBalance {
            current: current.total_points,
            required,
        });
    }

    let updated = UserBalance::find_by_id(user_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::UnknownUser {
            user_id: user_id.to_string(),
        })?;

    let entry = ledger_entry::ActiveModel {
        user_id: Set(user_id.to_string()),
        points_change: Set(points_change),
        operation_kind: Set(kind),
        description: Set(description.to_string()),
        reference_id: Set(reference_id),
        balance_after: Set(updated.total_points),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    debug!(
        user_id,
        points_change,
        new_balance = updated.total_points,
        "ledger entry appended"
    );

    Ok(AppendOutcome {
        entry,
        new_balance: updated.total_points,
    })
}

/// Increments a user's competition win counter and returns the new count.
pub async fn record_win<C>(db: &C, user_id: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    let result = UserBalance::update_many()
        .col_expr(
            user_balance::Column::WinsCount,
            Expr::col(user_balance::Column::WinsCount).add(1),
        )
        .col_expr(
            user_balance::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(user_balance::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::UnknownUser {
            user_id: user_id.to_string(),
        });
    }

    get_balance(db, user_id)
        .await?
        .map(|balance| balance.wins_count)
        .ok_or_else(|| Error::UnknownUser {
            user_id: user_id.to_string(),
        })
}

/// Retrieves every entry for a user in append order.
pub async fn get_entries_for_user<C>(db: &C, user_id: &str) -> Result<Vec<ledger_entry::Model>>
where
    C: ConnectionTrait,
{
    LedgerEntry::find()
        .filter(ledger_entry::Column::UserId.eq(user_id))
        .order_by_asc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the most recent entries for a user, newest first.
pub async fn get_recent_entries<C>(
    db: &C,
    user_id: &str,
    limit: u64,
) -> Result<Vec<ledger_entry::Model>>
where
    C: ConnectionTrait,
{
    LedgerEntry::find()
        .filter(ledger_entry::Column::UserId.eq(user_id))
        .order_by_desc(ledger_entry::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Recomputes a user's balance from the ledger and compares it with the stored one.
pub async fn audit_balance<C>(db: &C, user_id: &str) -> Result<BalanceAudit>
where
    C: ConnectionTrait,
{
    let balance = get_balance(db, user_id)
        .await?
        .ok_or_else(|| Error::UnknownUser {
            user_id: user_id.to_string(),
        })?;

    let ledger_sum = get_entries_for_user(db, user_id)
        .await?
        .iter()
        .map(|entry| entry.points_change)
        .sum();

    Ok(BalanceAudit {
        ledger_sum,
        materialized: balance.total_points,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_append_entry_rejects_zero() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = append_entry(&db, "user1", 0, OperationKind::Earned, "nothing", None).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 0 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_append_entry_rejects_unnegatable_change() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "user1", 50).await?;

        let result =
            append_entry(&db, "user1", i64::MIN, OperationKind::Spent, "overflow", None).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: i64::MIN })));

        let balance = get_balance(&db, "user1").await?.unwrap();
        assert_eq!(balance.total_points, 50);
        assert_eq!(get_entries_for_user(&db, "user1").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_append_entry_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;

        let result = append_entry(&db, "ghost", 10, OperationKind::Earned, "like", None).await;
        assert!(matches!(result, Err(Error::UnknownUser { user_id }) if user_id == "ghost"));

        // Nothing was written
        assert!(get_entries_for_user(&db, "ghost").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_ensure_balance_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;

        let first = ensure_balance(&db, "user1").await?;
        assert_eq!(first.total_points, 0);
        assert_eq!(first.wins_count, 0);

        append_entry(&db, "user1", 25, OperationKind::Earned, "task", None).await?;

        // A second provisioning call must not reset the balance
        let second = ensure_balance(&db, "user1").await?;
        assert_eq!(second.total_points, 25);

        Ok(())
    }

    #[tokio::test]
    async fn test_append_entry_updates_balance_and_records_entry() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_balance(&db, "user1").await?;

        let outcome = append_entry(
            &db,
            "user1",
            40,
            OperationKind::Earned,
            "task_completed",
            Some("task-7".to_string()),
        )
        .await?;

        assert_eq!(outcome.new_balance, 40);
        assert_eq!(outcome.entry.points_change, 40);
        assert_eq!(outcome.entry.balance_after, 40);
        assert_eq!(outcome.entry.operation_kind, OperationKind::Earned);
        assert_eq!(outcome.entry.reference_id.as_deref(), Some("task-7"));

        let balance = get_balance(&db, "user1").await?.unwrap();
        assert_eq!(balance.total_points, 40);

        Ok(())
    }

    #[tokio::test]
    async fn test_negative_append_rejected_and_balance_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "user1", 50).await?;

        let result = append_entry(&db, "user1", -80, OperationKind::Spent, "too much", None).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                current: 50,
                required: 80
            })
        ));

        let balance = get_balance(&db, "user1").await?.unwrap();
        assert_eq!(balance.total_points, 50);
        assert_eq!(get_entries_for_user(&db, "user1").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_spending_entire_balance_is_allowed() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "user1", 30).await?;

        let outcome = append_entry(&db, "user1", -30, OperationKind::Spent, "all in", None).await?;
        assert_eq!(outcome.new_balance, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_balance_equals_sum_of_entries() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_balance(&db, "user1").await?;

        let changes = [100, -30, 15, -85, 7];
        for change in changes {
            let kind = if change < 0 {
                OperationKind::Spent
            } else {
                OperationKind::Earned
            };
            append_entry(&db, "user1", change, kind, "mixed", None).await?;
        }
        // Rejected debit leaves no trace
        assert!(
            append_entry(&db, "user1", -1_000, OperationKind::Spent, "nope", None)
                .await
                .is_err()
        );

        let audit = audit_balance(&db, "user1").await?;
        assert!(audit.is_consistent());
        assert_eq!(audit.materialized, 7);

        let entries = get_entries_for_user(&db, "user1").await?;
        assert_eq!(entries.len(), changes.len());
        // balance_after tracks the running total in append order
        let mut running = 0;
        for entry in &entries {
            running += entry.points_change;
            assert_eq!(entry.balance_after, running);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_spends_cannot_overdraw() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "user1", 10).await?;

        let (first, second) = tokio::join!(
            append_entry(&db, "user1", -8, OperationKind::Spent, "first", None),
            append_entry(&db, "user1", -8, OperationKind::Spent, "second", None),
        );

        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);

        let balance = get_balance(&db, "user1").await?.unwrap();
        assert_eq!(balance.total_points, 2);
        assert!(audit_balance(&db, "user1").await?.is_consistent());

        Ok(())
    }

    #[tokio::test]
    async fn test_append_inside_rolled_back_transaction_leaves_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "user1", 10).await?;

        let txn = db.begin().await?;
        append_entry(&txn, "user1", 5, OperationKind::Earned, "pending", None).await?;
        txn.rollback().await?;

        let balance = get_balance(&db, "user1").await?.unwrap();
        assert_eq!(balance.total_points, 10);
        assert_eq!(get_entries_for_user(&db, "user1").await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_win_increments_counter() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_balance(&db, "user1").await?;

        assert_eq!(record_win(&db, "user1").await?, 1);
        assert_eq!(record_win(&db, "user1").await?, 2);

        let result = record_win(&db, "ghost").await;
        assert!(matches!(result, Err(Error::UnknownUser { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_recent_entries_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        ensure_balance(&db, "user1").await?;
        for points in [1, 2, 3] {
            append_entry(&db, "user1", points, OperationKind::Earned, "like", None).await?;
        }

        let recent = get_recent_entries(&db, "user1", 2).await?;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].points_change, 3);
        assert_eq!(recent[1].points_change, 2);

        Ok(())
    }
}
