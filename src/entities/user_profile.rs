//! User profile entity - Account status flags read by the gateway.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    /// Platform user ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Elevated account status, required for high-value withdrawals
    pub is_premium: bool,
    /// When the profile last changed
    pub updated_at: DateTimeUtc,
}

/// `UserProfile` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
