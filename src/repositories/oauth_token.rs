use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use ulid::Ulid;

use crate::error::ApiError;
use crate::models::OauthToken;

const OAUTH_TOKEN_COLUMNS: &str = "id, consent_id, access_token_jti, refresh_token_jti, \
     id_token_jti, expires_at, created_at, updated_at, deleted_at";

/// Repository for issued token sets, indexed by their JTIs
#[derive(Clone)]
pub struct OauthTokenRepository {
    pool: MySqlPool,
}

impl OauthTokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        consent_id: &str,
        access_token_jti: &str,
        refresh_token_jti: &str,
        id_token_jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OauthToken, ApiError> {
        let id = Ulid::new().to_string();

        sqlx::query(
            "INSERT INTO oauth_tokens \
             (id, consent_id, access_token_jti, refresh_token_jti, id_token_jti, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(consent_id)
        .bind(access_token_jti)
        .bind(refresh_token_jti)
        .bind(id_token_jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        let token = sqlx::query_as::<_, OauthToken>(&format!(
            "SELECT {OAUTH_TOKEN_COLUMNS} FROM oauth_tokens WHERE id = ?"
        ))
        .bind(&id)
        .fetch_optional(&self.pool)
        .await?;

        token.ok_or_else(|| ApiError::Internal(anyhow::anyhow!("failed to fetch created token set")))
    }

    pub async fn find_live_by_access_jti(&self, jti: &str) -> Result<Option<OauthToken>, ApiError> {
        let token = sqlx::query_as::<_, OauthToken>(&format!(
            "SELECT {OAUTH_TOKEN_COLUMNS} FROM oauth_tokens \
             WHERE access_token_jti = ? AND deleted_at IS NULL"
        ))
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    pub async fn find_live_by_refresh_jti(&self, jti: &str) -> Result<Option<OauthToken>, ApiError> {
        let token = sqlx::query_as::<_, OauthToken>(&format!(
            "SELECT {OAUTH_TOKEN_COLUMNS} FROM oauth_tokens \
             WHERE refresh_token_jti = ? AND deleted_at IS NULL"
        ))
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Soft-delete by access JTI; returns affected rows so revocation can
    /// fall back to the other column.
    pub async fn soft_delete_by_access_jti(&self, jti: &str) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE oauth_tokens SET deleted_at = NOW() \
             WHERE access_token_jti = ? AND deleted_at IS NULL",
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn soft_delete_by_refresh_jti(&self, jti: &str) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE oauth_tokens SET deleted_at = NOW() \
             WHERE refresh_token_jti = ? AND deleted_at IS NULL",
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
