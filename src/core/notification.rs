//! Notification outbox - Payloads queued for the delivery collaborator.
//!
//! Producers enqueue after their own transaction has committed; a failed enqueue is
//! the producer's to log, never a reason to undo the operation that produced it.
//! Delivery drains [`pending`] and calls [`mark_delivered`] or
//! [`record_failed_attempt`].

use crate::{
    entities::{Notification, notification},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::debug;

/// Kind tag for a competition winner announcement
pub const WINNER_ANNOUNCEMENT: &str = "winner_announcement";
/// Kind tag for an achievement completion
pub const ACHIEVEMENT_COMPLETED: &str = "achievement_completed";

/// Serializes `payload` and appends it to the outbox.
pub async fn enqueue<C, P>(
    db: &C,
    kind: &str,
    user_id: &str,
    payload: &P,
) -> Result<notification::Model>
where
    C: ConnectionTrait,
    P: Serialize + Sync,
{
    let body = serde_json::to_string(payload)?;

    let stored = notification::ActiveModel {
        kind: Set(kind.to_string()),
        user_id: Set(user_id.to_string()),
        payload: Set(body),
        attempts: Set(0),
        created_at: Set(chrono::Utc::now()),
        delivered_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    debug!(id = stored.id, kind, user_id, "notification enqueued");
    Ok(stored)
}

/// Undelivered notifications, oldest first.
pub async fn pending<C>(db: &C, limit: u64) -> Result<Vec<notification::Model>>
where
    C: ConnectionTrait,
{
    Notification::find()
        .filter(notification::Column::DeliveredAt.is_null())
        .order_by_asc(notification::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a notification delivered. Returns false if it already was.
pub async fn mark_delivered<C>(db: &C, notification_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Notification::update_many()
        .col_expr(
            notification::Column::DeliveredAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(notification::Column::Id.eq(notification_id))
        .filter(notification::Column::DeliveredAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Counts a failed delivery; the notification stays pending.
pub async fn record_failed_attempt<C>(db: &C, notification_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    Notification::update_many()
        .col_expr(
            notification::Column::Attempts,
            Expr::col(notification::Column::Attempts).add(1),
        )
        .filter(notification::Column::Id.eq(notification_id))
        .exec(db)
        .await?;
    Ok(())
}
