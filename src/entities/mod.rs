//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod achievement;
pub mod achievement_progress;
pub mod competition_video;
pub mod ledger_entry;
pub mod market_item;
pub mod notification;
pub mod purchase;
pub mod settlement;
pub mod user_balance;
pub mod user_profile;
pub mod withdrawal_request;

// Re-export specific types to avoid conflicts
pub use achievement::{
    Column as AchievementColumn, Entity as Achievement, Model as AchievementModel,
};
pub use achievement_progress::{
    Column as AchievementProgressColumn, Entity as AchievementProgress,
    Model as AchievementProgressModel,
};
pub use competition_video::{
    Column as CompetitionVideoColumn, Entity as CompetitionVideo, Model as CompetitionVideoModel,
};
pub use ledger_entry::{
    Column as LedgerEntryColumn, Entity as LedgerEntry, Model as LedgerEntryModel, OperationKind,
};
pub use market_item::{Column as MarketItemColumn, Entity as MarketItem, Model as MarketItemModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
};
pub use purchase::{Column as PurchaseColumn, Entity as Purchase, Model as PurchaseModel};
pub use settlement::{Column as SettlementColumn, Entity as Settlement, Model as SettlementModel};
pub use user_balance::{
    Column as UserBalanceColumn, Entity as UserBalance, Model as UserBalanceModel,
};
pub use user_profile::{
    Column as UserProfileColumn, Entity as UserProfile, Model as UserProfileModel,
};
pub use withdrawal_request::{
    Column as WithdrawalRequestColumn, Entity as WithdrawalRequest,
    Model as WithdrawalRequestModel, WithdrawalStatus,
};
