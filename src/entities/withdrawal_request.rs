//! Withdrawal request entity - A cash or crypto payout backed by held points.
//!
//! The points are debited from the ledger when the request is created. Approval,
//! payout and rejection are driven by an external review process; rejection returns
//! the held points through a refund entry.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a withdrawal request
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Awaiting review
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved, payout not yet sent
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected, held points refunded
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Payout sent
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl WithdrawalStatus {
    /// Lowercase name used in messages and storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }
}

/// Withdrawal request database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawal_requests")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Requesting user
    pub user_id: String,
    /// Points held for this payout
    pub amount_points: i64,
    /// Payout in currency units, derived from `amount_points`
    pub payout_amount: f64,
    /// Payout rail (e.g. `"card"`, `"usdt"`)
    pub payout_method: String,
    /// Card number, wallet address or similar
    pub destination: String,
    /// Current lifecycle state
    pub status: WithdrawalStatus,
    /// Ledger entry that held the points
    pub ledger_entry_id: i64,
    /// When the request was created
    pub created_at: DateTimeUtc,
    /// When the status last changed
    pub updated_at: DateTimeUtc,
}

/// `WithdrawalRequest` has no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
