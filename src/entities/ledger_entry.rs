//! Ledger entry entity - One immutable record of a points balance change.
//!
//! Entries are append-only. Refunds and reversals are new entries, never edits.
//! The auto-increment `id` gives the total order of entries for a user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of balance change an entry records
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Points earned from likes, tasks, prizes or achievements
    #[sea_orm(string_value = "earned")]
    Earned,
    /// Points spent in the marketplace
    #[sea_orm(string_value = "spent")]
    Spent,
    /// Points held for a cash or crypto payout
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Points returned after a rejected withdrawal or a reversal
    #[sea_orm(string_value = "refund")]
    Refund,
}

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier, increasing in append order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the balance this entry changed
    pub user_id: String,
    /// Signed change (positive for credits, negative for debits)
    pub points_change: i64,
    /// Kind of operation
    pub operation_kind: OperationKind,
    /// Human-readable reason
    pub description: String,
    /// Originating purchase, withdrawal, video, task or achievement id
    pub reference_id: Option<String>,
    /// Balance immediately after this entry was applied
    pub balance_after: i64,
    /// When the entry was appended
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `LedgerEntry` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one user balance
    #[sea_orm(
        belongs_to = "super::user_balance::Entity",
        from = "Column::UserId",
        to = "super::user_balance::Column::UserId"
    )]
    UserBalance,
}

impl Related<super::user_balance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserBalance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
