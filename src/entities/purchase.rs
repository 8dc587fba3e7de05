//! Purchase entity - A completed marketplace purchase.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Buyer
    pub user_id: String,
    /// Item bought
    pub item_id: i64,
    /// Units bought
    pub quantity: i64,
    /// Price per unit at the time of purchase
    pub unit_price: i64,
    /// Points debited
    pub total_points: i64,
    /// Ledger entry that paid for the purchase
    pub ledger_entry_id: i64,
    /// When the purchase happened
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Purchase and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each purchase is of one market item
    #[sea_orm(
        belongs_to = "super::market_item::Entity",
        from = "Column::ItemId",
        to = "super::market_item::Column::Id"
    )]
    MarketItem,
}

impl Related<super::market_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarketItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
