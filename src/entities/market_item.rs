//! Market item entity - Items purchasable with points.
//!
//! Each item has a points price and a finite stock that purchases decrement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Market item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "market_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g. "Sticker Pack", "Pro Membership")
    pub name: String,
    /// Price per unit in points
    pub price_points: i64,
    /// Units left
    pub stock: i64,
    /// Soft delete flag - if true, item is hidden but purchase history is preserved
    pub is_deleted: bool,
    /// When the item was created
    pub created_at: DateTimeUtc,
    /// When the item was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `MarketItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One item has many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
