use sqlx::MySqlPool;

use crate::error::ApiError;
use crate::models::{Profile, User, USER_STATUS_ACTIVE};

const USER_COLUMNS: &str = "id, custom_id, email, external_email, email_verified, password_hash, \
     status, affiliation_period, totp_secret, is_totp_enabled, created_at, updated_at, deleted_at";

/// Repository for user and profile rows
#[derive(Clone)]
pub struct UserRepository {
    pool: MySqlPool,
}

impl UserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Find a live, active user by login handle.
    pub async fn find_active_by_custom_id(&self, custom_id: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE custom_id = ? AND deleted_at IS NULL AND status = ?"
        ))
        .bind(custom_id)
        .bind(USER_STATUS_ACTIVE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a live user by id regardless of status.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a live, active user by id.
    pub async fn find_active_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL AND status = ?"
        ))
        .bind(id)
        .bind(USER_STATUS_ACTIVE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a live user by the external (recovery) email address.
    pub async fn find_by_external_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_email = ? AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store a provisioned TOTP secret without enabling TOTP yet.
    pub async fn set_totp_secret(&self, id: &str, secret: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET totp_secret = ? WHERE id = ?")
            .bind(secret)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn enable_totp(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET is_totp_enabled = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn disable_totp(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET totp_secret = '', is_totp_enabled = FALSE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, ApiError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT user_id, display_name, bio, website_url, twitter_handle, birthdate, updated_at \
             FROM profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
