//! Market catalogue - Items that can be bought with points.
//!
//! This module manages the item catalogue: creation, lookup, repricing, restocking and
//! soft deletion. Buying an item is a ledger operation and lives in
//! [`crate::core::gateway::purchase`].

use crate::{
    entities::{MarketItem, market_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// Retrieves all active (non-deleted) items, ordered alphabetically by name.
pub async fn get_all_active_items<C>(db: &C) -> Result<Vec<market_item::Model>>
where
    C: ConnectionTrait,
{
    MarketItem::find()
        .filter(market_item::Column::IsDeleted.eq(false))
        .order_by_asc(market_item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an active item by name.
pub async fn get_item_by_name<C>(db: &C, name: &str) -> Result<Option<market_item::Model>>
where
    C: ConnectionTrait,
{
    MarketItem::find()
        .filter(market_item::Column::Name.eq(name))
        .filter(market_item::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an item by ID, including deleted ones.
pub async fn get_item_by_id<C>(db: &C, item_id: i64) -> Result<Option<market_item::Model>>
where
    C: ConnectionTrait,
{
    MarketItem::find_by_id(item_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new item.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is not positive or the stock is negative
/// - The database insert fails
pub async fn create_item<C>(
    db: &C,
    name: &str,
    price_points: i64,
    stock: i64,
) -> Result<market_item::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Item name cannot be empty".to_string(),
        });
    }
    if price_points <= 0 {
        return Err(Error::InvalidAmount {
            amount: price_points,
        });
    }
    if stock < 0 {
        return Err(Error::InvalidQuantity { quantity: stock });
    }

    let now = chrono::Utc::now();
    let item = market_item::ActiveModel {
        name: Set(name.trim().to_string()),
        price_points: Set(price_points),
        stock: Set(stock),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}

async fn find_active<C>(db: &C, item_id: i64) -> Result<market_item::Model>
where
    C: ConnectionTrait,
{
    get_item_by_id(db, item_id)
        .await?
        .filter(|item| !item.is_deleted)
        .ok_or_else(|| Error::ItemNotFound {
            item: item_id.to_string(),
        })
}

/// Changes an item's price. Purchases already made keep the price they paid.
pub async fn update_item_price<C>(
    db: &C,
    item_id: i64,
    new_price: i64,
) -> Result<market_item::Model>
where
    C: ConnectionTrait,
{
    if new_price <= 0 {
        return Err(Error::InvalidAmount { amount: new_price });
    }

    let mut item: market_item::ActiveModel = find_active(db, item_id).await?.into();
    item.price_points = Set(new_price);
    item.updated_at = Set(chrono::Utc::now());
    item.update(db).await.map_err(Into::into)
}

/// Adds units to an item's stock with a single atomic update.
pub async fn restock_item<C>(db: &C, item_id: i64, added: i64) -> Result<market_item::Model>
where
    C: ConnectionTrait,
{
    if added <= 0 {
        return Err(Error::InvalidQuantity { quantity: added });
    }

    find_active(db, item_id).await?;
    MarketItem::update_many()
        .col_expr(
            market_item::Column::Stock,
            Expr::col(market_item::Column::Stock).add(added),
        )
        .col_expr(
            market_item::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(market_item::Column::Id.eq(item_id))
        .exec(db)
        .await?;

    find_active(db, item_id).await
}

/// Soft deletes an item, preserving purchase history.
pub async fn delete_item<C>(db: &C, item_id: i64) -> Result<market_item::Model>
where
    C: ConnectionTrait,
{
    let mut item: market_item::ActiveModel = find_active(db, item_id).await?.into();
    item.is_deleted = Set(true);
    item.updated_at = Set(chrono::Utc::now());
    item.update(db).await.map_err(Into::into)
}
