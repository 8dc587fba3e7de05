//! Notification entity - Outbox of payloads awaiting delivery.
//!
//! Rows are written after the operation that produced them has committed and are
//! drained by the delivery collaborator, which marks them delivered.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification outbox database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Payload type (e.g. `"winner_announcement"`)
    pub kind: String,
    /// Recipient or subject user
    pub user_id: String,
    /// JSON-encoded payload
    pub payload: String,
    /// Failed delivery attempts so far
    pub attempts: i32,
    /// When the notification was enqueued
    pub created_at: DateTimeUtc,
    /// When delivery succeeded, None while pending
    pub delivered_at: Option<DateTimeUtc>,
}

/// `Notification` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
