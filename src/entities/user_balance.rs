//! User balance entity - The materialized points balance per user.
//!
//! Rows are provisioned lazily by the ledger and only ever mutated alongside a new
//! ledger entry, so `total_points` always equals the sum of that user's entries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User balance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_balances")]
pub struct Model {
    /// Platform user ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Current points balance, never negative
    pub total_points: i64,
    /// Number of competitions this user has won
    pub wins_count: i64,
    /// When the balance last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `UserBalance` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One balance has many ledger entries
    #[sea_orm(has_many = "super::ledger_entry::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
