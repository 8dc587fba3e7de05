//! Unified error type for the ledger, gateway, achievement and settlement layers.
//!
//! Domain failures carry enough context to render a readable reply; infrastructure
//! failures (database, I/O, framework) are wrapped and surfaced as a generic retryable
//! error by [`Error::user_message`].

use chrono::NaiveDate;
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A debit would take the balance below zero
    #[error("Insufficient balance: have {current} points, need {required}")]
    InsufficientBalance {
        /// Balance at the time of the attempt
        current: i64,
        /// Points the operation tried to take
        required: i64,
    },

    /// Withdrawal amount is under the configured floor
    #[error("Withdrawal of {amount} points is below the minimum of {minimum}")]
    BelowMinimum {
        /// Requested amount
        amount: i64,
        /// Configured minimum
        minimum: i64,
    },

    /// High-value withdrawal attempted by a non-premium account
    #[error("Withdrawal of {amount} points requires premium status (threshold {threshold})")]
    PremiumRequired {
        /// Requested amount
        amount: i64,
        /// Amount at which premium becomes mandatory
        threshold: i64,
    },

    /// Requested quantity exceeds remaining stock
    #[error("Item {item_id} is out of stock: requested {requested}, remaining {remaining}")]
    OutOfStock {
        /// Market item id
        item_id: i64,
        /// Requested quantity
        requested: i64,
        /// Stock left
        remaining: i64,
    },

    /// No balance row exists for the user
    #[error("Unknown user: {user_id}")]
    UnknownUser {
        /// The user id that was looked up
        user_id: String,
    },

    /// Settlement window contained no videos
    #[error("No eligible videos for {date}")]
    NoEligibleVideos {
        /// Settlement period
        date: NaiveDate,
    },

    /// Settlement period already has a winner
    #[error("Competition for {date} is already settled")]
    AlreadySettled {
        /// Settlement period
        date: NaiveDate,
    },

    /// Zero or negative amount where a positive one is required
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// Purchase quantity must be positive
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// Market item missing or soft-deleted
    #[error("Item not found: {item}")]
    ItemNotFound {
        /// Item id or name as given
        item: String,
    },

    /// No withdrawal request with this id
    #[error("Withdrawal request not found: {id}")]
    WithdrawalNotFound {
        /// Request id
        id: i64,
    },

    /// No competition video with this id
    #[error("Video not found: {video_id}")]
    VideoNotFound {
        /// Video id
        video_id: i64,
    },

    /// Engagement metrics out of range
    #[error("Invalid video metrics: {message}")]
    InvalidMetrics {
        /// Which metric was wrong
        message: String,
    },

    /// Withdrawal state machine rejected the transition
    #[error("Cannot move withdrawal {id} from {from} to {to}")]
    InvalidStatusTransition {
        /// Request id
        id: i64,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Bad or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Details
        message: String,
    },

    /// Underlying `SeaORM` failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Notification payload encoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Discord framework failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Whether the failure is an infrastructure hiccup worth retrying as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Io(_) | Self::Framework(_) | Self::Serialization(_)
        )
    }

    /// Message suitable for showing to the user who triggered the operation.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientBalance { current, required } => {
                format!("❌ Not enough points: you have {current}, this needs {required}.")
            }
            Self::BelowMinimum { minimum, .. } => {
                format!("❌ The minimum withdrawal is {minimum} points.")
            }
            Self::PremiumRequired { threshold, .. } => {
                format!("❌ Withdrawals of {threshold} points or more require a premium account.")
            }
            Self::OutOfStock { remaining, .. } => {
                format!("❌ Not enough stock left (only {remaining} available).")
            }
            Self::UnknownUser { .. } => "❌ No points account exists for this user yet.".to_string(),
            Self::NoEligibleVideos { date } => {
                format!("ℹ️ No videos were submitted on {date}, so there is no winner.")
            }
            Self::AlreadySettled { date } => {
                format!("ℹ️ The competition for {date} already has a winner.")
            }
            Self::InvalidAmount { .. } => "❌ Amount must be greater than zero.".to_string(),
            Self::InvalidQuantity { .. } => "❌ Quantity must be greater than zero.".to_string(),
            Self::ItemNotFound { item } => format!("❌ Item '{item}' was not found."),
            Self::WithdrawalNotFound { id } => format!("❌ Withdrawal #{id} was not found."),
            Self::VideoNotFound { video_id } => format!("❌ Video #{video_id} was not found."),
            Self::InvalidMetrics { message } => format!("❌ Invalid video metrics: {message}."),
            Self::InvalidStatusTransition { id, from, .. } => {
                format!("❌ Withdrawal #{id} is already {from}.")
            }
            Self::Config { .. }
            | Self::Database(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Framework(_) => "⚠️ Something went wrong on our side. Please try again.".to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_not_retryable() {
        let err = Error::InsufficientBalance {
            current: 50,
            required: 80,
        };
        assert!(!err.is_retryable());
        assert!(err.user_message().contains("50"));
        assert!(err.user_message().contains("80"));
    }

    #[test]
    fn test_database_errors_surface_generic_message() {
        let err = Error::Database(sea_orm::DbErr::Custom("disk I/O".to_string()));
        assert!(err.is_retryable());
        assert!(err.user_message().contains("try again"));
        assert!(!err.user_message().contains("disk"));
    }

    #[test]
    fn test_each_domain_error_has_distinct_message() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default();
        let messages = [
            Error::BelowMinimum {
                amount: 1,
                minimum: 2,
            }
            .user_message(),
            Error::PremiumRequired {
                amount: 1,
                threshold: 2,
            }
            .user_message(),
            Error::OutOfStock {
                item_id: 1,
                requested: 2,
                remaining: 1,
            }
            .user_message(),
            Error::UnknownUser {
                user_id: "u".to_string(),
            }
            .user_message(),
            Error::NoEligibleVideos { date }.user_message(),
            Error::AlreadySettled { date }.user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
