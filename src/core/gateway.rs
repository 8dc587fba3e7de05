//! Spend/credit gateway - Validated entry points that move points.
//!
//! Every function here validates its domain rules and then delegates to
//! [`ledger::append_entry`](crate::core::ledger::append_entry), which owns atomicity and
//! the non-negative balance check. Balances are provisioned lazily on first contact.
//! Purchases and withdrawals wrap the debit and their own records in one transaction so
//! neither can exist without the other.

use crate::{
    config::economy::WithdrawalPolicy,
    core::{
        ledger::{self, AppendOutcome},
        market, user,
    },
    entities::{
        OperationKind, Purchase, WithdrawalRequest, WithdrawalStatus, market_item, purchase,
        withdrawal_request,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::info;

/// Everything recorded by a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// The stored purchase
    pub purchase: purchase::Model,
    /// Item state after the stock decrement
    pub item: market_item::Model,
    /// Buyer's balance after paying
    pub new_balance: i64,
}

fn validate_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

async fn apply<C>(
    db: &C,
    user_id: &str,
    points_change: i64,
    kind: OperationKind,
    reason: &str,
    reference_id: Option<String>,
) -> Result<AppendOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    ledger::ensure_balance(&txn, user_id).await?;
    let outcome =
        ledger::append_entry(&txn, user_id, points_change, kind, reason, reference_id).await?;
    txn.commit().await?;
    Ok(outcome)
}

/// Credits earned points (likes, tasks, prizes, achievements).
///
/// # Errors
/// `InvalidAmount` unless `amount > 0`.
pub async fn credit<C>(
    db: &C,
    user_id: &str,
    amount: i64,
    reason: &str,
    reference_id: Option<String>,
) -> Result<AppendOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_amount(amount)?;
    let outcome = apply(db, user_id, amount, OperationKind::Earned, reason, reference_id).await?;
    info!(user_id, amount, reason, "points credited");
    Ok(outcome)
}

/// Returns points to a user as a new offsetting entry.
pub async fn refund<C>(
    db: &C,
    user_id: &str,
    amount: i64,
    reason: &str,
    reference_id: Option<String>,
) -> Result<AppendOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_amount(amount)?;
    let outcome = apply(db, user_id, amount, OperationKind::Refund, reason, reference_id).await?;
    info!(user_id, amount, reason, "points refunded");
    Ok(outcome)
}

/// Spends points. The balance is left untouched on failure.
///
/// # Errors
/// `InvalidAmount` unless `amount > 0`; `InsufficientBalance` if the balance is
/// smaller than `amount`.
pub async fn debit<C>(
    db: &C,
    user_id: &str,
    amount: i64,
    reason: &str,
    reference_id: Option<String>,
) -> Result<AppendOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_amount(amount)?;
    let outcome = apply(db, user_id, -amount, OperationKind::Spent, reason, reference_id).await?;
    info!(user_id, amount, reason, "points debited");
    Ok(outcome)
}

/// Buys `quantity` units of a market item.
///
/// Price, stock, debit and stock decrement are read and written inside one transaction,
/// so a concurrent reprice or sale cannot slip between them.
///
/// # Errors
/// * `InvalidQuantity` unless `quantity > 0`
/// * `ItemNotFound` if the item is missing or deleted
/// * `OutOfStock` if fewer than `quantity` units remain
/// * `InsufficientBalance` if the buyer cannot afford it
pub async fn purchase<C>(
    db: &C,
    user_id: &str,
    item_id: i64,
    quantity: i64,
) -> Result<PurchaseReceipt>
where
    C: ConnectionTrait + TransactionTrait,
{
    if quantity <= 0 {
        return Err(Error::InvalidQuantity { quantity });
    }

    let txn = db.begin().await?;

    let item = market::get_item_by_id(&txn, item_id)
        .await?
        .filter(|item| !item.is_deleted)
        .ok_or_else(|| Error::ItemNotFound {
            item: item_id.to_string(),
        })?;

    if quantity > item.stock {
        return Err(Error::OutOfStock {
            item_id,
            requested: quantity,
            remaining: item.stock,
        });
    }

    let total = item
        .price_points
        .checked_mul(quantity)
        .ok_or(Error::InvalidQuantity { quantity })?;

    ledger::ensure_balance(&txn, user_id).await?;
    let outcome = ledger::append_entry(
        &txn,
        user_id,
        -total,
        OperationKind::Spent,
        &format!("purchase: {quantity}x {}", item.name),
        Some(item.id.to_string()),
    )
    .await?;

    let stored = purchase::ActiveModel {
        user_id: Set(user_id.to_string()),
        item_id: Set(item.id),
        quantity: Set(quantity),
        unit_price: Set(item.price_points),
        total_points: Set(total),
        ledger_entry_id: Set(outcome.entry.id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let decremented = market_item::Entity::update_many()
        .col_expr(
            market_item::Column::Stock,
            Expr::col(market_item::Column::Stock).sub(quantity),
        )
        .filter(market_item::Column::Id.eq(item.id))
        .filter(market_item::Column::Stock.gte(quantity))
        .exec(&txn)
        .await?;
    if decremented.rows_affected == 0 {
        return Err(Error::OutOfStock {
            item_id,
            requested: quantity,
            remaining: item.stock,
        });
    }

    let item = market::get_item_by_id(&txn, item.id)
        .await?
        .ok_or_else(|| Error::ItemNotFound {
            item: item_id.to_string(),
        })?;

    txn.commit().await?;

    info!(user_id, item_id, quantity, total, "purchase completed");

    Ok(PurchaseReceipt {
        purchase: stored,
        item,
        new_balance: outcome.new_balance,
    })
}

/// Retrieves a user's purchases, newest first.
pub async fn get_purchases_for_user<C>(db: &C, user_id: &str) -> Result<Vec<purchase::Model>>
where
    C: ConnectionTrait,
{
    Purchase::find()
        .filter(purchase::Column::UserId.eq(user_id))
        .order_by_desc(purchase::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Converts points to payout currency units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn payout_for(policy: &WithdrawalPolicy, amount_points: i64) -> f64 {
    amount_points as f64 / policy.points_per_unit as f64
}

/// Creates a pending withdrawal and holds its points.
///
/// The minimum and premium checks run before the balance is looked at, so a request
/// below the floor is rejected even for a user who could afford it.
///
/// # Errors
/// * `BelowMinimum` if `amount_points < policy.minimum_points`
/// * `PremiumRequired` if the amount reaches the premium threshold on a regular account
/// * `InsufficientBalance` if the points are not there
pub async fn request_withdrawal<C>(
    db: &C,
    policy: &WithdrawalPolicy,
    user_id: &str,
    amount_points: i64,
    payout_method: &str,
    destination: &str,
) -> Result<withdrawal_request::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_amount(amount_points)?;
    if amount_points < policy.minimum_points {
        return Err(Error::BelowMinimum {
            amount: amount_points,
            minimum: policy.minimum_points,
        });
    }
    if amount_points >= policy.premium_threshold_points && !user::is_premium(db, user_id).await?
    {
        return Err(Error::PremiumRequired {
            amount: amount_points,
            threshold: policy.premium_threshold_points,
        });
    }

    let txn = db.begin().await?;
    let now = chrono::Utc::now();

    // Insert first so the hold can reference the request; both commit together.
    let request = withdrawal_request::ActiveModel {
        user_id: Set(user_id.to_string()),
        amount_points: Set(amount_points),
        payout_amount: Set(payout_for(policy, amount_points)),
        payout_method: Set(payout_method.to_string()),
        destination: Set(destination.to_string()),
        status: Set(WithdrawalStatus::Pending),
        ledger_entry_id: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    ledger::ensure_balance(&txn, user_id).await?;
    let outcome = ledger::append_entry(
        &txn,
        user_id,
        -amount_points,
        OperationKind::Withdrawal,
        &format!("withdrawal via {payout_method}"),
        Some(request.id.to_string()),
    )
    .await?;

    let mut linked: withdrawal_request::ActiveModel = request.into();
    linked.ledger_entry_id = Set(outcome.entry.id);
    let request = linked.update(&txn).await?;

    txn.commit().await?;

    info!(
        user_id,
        amount_points,
        request_id = request.id,
        "withdrawal requested"
    );
    Ok(request)
}

const fn can_transition(from: WithdrawalStatus, to: WithdrawalStatus) -> bool {
    matches!(
        (from, to),
        (
            WithdrawalStatus::Pending,
            WithdrawalStatus::Approved | WithdrawalStatus::Rejected
        ) | (
            WithdrawalStatus::Approved,
            WithdrawalStatus::Paid | WithdrawalStatus::Rejected
        )
    )
}

async fn transition<C>(
    db: &C,
    request_id: i64,
    to: WithdrawalStatus,
) -> Result<withdrawal_request::Model>
where
    C: ConnectionTrait,
{
    let request = WithdrawalRequest::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or(Error::WithdrawalNotFound { id: request_id })?;

    let invalid = || Error::InvalidStatusTransition {
        id: request_id,
        from: request.status.as_str().to_string(),
        to: to.as_str().to_string(),
    };

    if !can_transition(request.status, to) {
        return Err(invalid());
    }

    // Guard on the status we read so two reviewers cannot both move the request.
    let updated = WithdrawalRequest::update_many()
        .col_expr(withdrawal_request::Column::Status, Expr::value(to))
        .col_expr(
            withdrawal_request::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(withdrawal_request::Column::Id.eq(request_id))
        .filter(withdrawal_request::Column::Status.eq(request.status))
        .exec(db)
        .await?;
    if updated.rows_affected == 0 {
        return Err(invalid());
    }

    WithdrawalRequest::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or(Error::WithdrawalNotFound { id: request_id })
}

/// Moves a pending withdrawal to approved.
pub async fn approve_withdrawal<C>(db: &C, request_id: i64) -> Result<withdrawal_request::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let request = transition(db, request_id, WithdrawalStatus::Approved).await?;
    info!(request_id, "withdrawal approved");
    Ok(request)
}

/// Moves an approved withdrawal to paid.
pub async fn mark_withdrawal_paid<C>(db: &C, request_id: i64) -> Result<withdrawal_request::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let request = transition(db, request_id, WithdrawalStatus::Paid).await?;
    info!(request_id, "withdrawal paid");
    Ok(request)
}

/// Rejects a withdrawal and refunds the held points in the same transaction.
pub async fn reject_withdrawal<C>(
    db: &C,
    request_id: i64,
    reason: &str,
) -> Result<(withdrawal_request::Model, AppendOutcome)>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let request = transition(&txn, request_id, WithdrawalStatus::Rejected).await?;
    let outcome = ledger::append_entry(
        &txn,
        &request.user_id,
        request.amount_points,
        OperationKind::Refund,
        &format!("withdrawal rejected: {reason}"),
        Some(request.id.to_string()),
    )
    .await?;
    txn.commit().await?;

    info!(request_id, user_id = %request.user_id, "withdrawal rejected and refunded");
    Ok((request, outcome))
}

/// Retrieves a user's withdrawal requests, newest first.
pub async fn get_withdrawals_for_user<C>(
    db: &C,
    user_id: &str,
) -> Result<Vec<withdrawal_request::Model>>
where
    C: ConnectionTrait,
{
    WithdrawalRequest::find()
        .filter(withdrawal_request::Column::UserId.eq(user_id))
        .order_by_desc(withdrawal_request::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
