//! User status - Premium flag lookups used by the withdrawal policy.

use crate::{
    entities::{UserProfile, user_profile},
    errors::Result,
};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};

/// Whether a user holds premium status. Users without a profile are not premium.
pub async fn is_premium<C>(db: &C, user_id: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    Ok(UserProfile::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .is_some_and(|profile| profile.is_premium))
}

/// Sets or clears a user's premium status, creating the profile if needed.
pub async fn set_premium<C>(db: &C, user_id: &str, is_premium: bool) -> Result<()>
where
    C: ConnectionTrait,
{
    let profile = user_profile::ActiveModel {
        user_id: Set(user_id.to_string()),
        is_premium: Set(is_premium),
        updated_at: Set(chrono::Utc::now()),
    };

    UserProfile::insert(profile)
        .on_conflict(
            OnConflict::column(user_profile::Column::UserId)
                .update_columns([
                    user_profile::Column::IsPremium,
                    user_profile::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_missing_profile_is_not_premium() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(!is_premium(&db, "nobody").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_premium_round_trip() -> Result<()> {
        let db = setup_test_db().await?;

        set_premium(&db, "user1", true).await?;
        assert!(is_premium(&db, "user1").await?);

        set_premium(&db, "user1", false).await?;
        assert!(!is_premium(&db, "user1").await?);

        Ok(())
    }
}
