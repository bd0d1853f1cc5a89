use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use ulid::Ulid;

use crate::error::ApiError;
use crate::models::EmailVerificationCode;

/// Repository for mailed verification codes
#[derive(Clone)]
pub struct EmailVerificationCodeRepository {
    pool: MySqlPool,
}

impl EmailVerificationCodeRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        code: &str,
        request_type: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO email_verification_codes (id, user_id, code, request_type, expires_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Ulid::new().to_string())
        .bind(user_id)
        .bind(code)
        .bind(request_type)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_code(
        &self,
        code: &str,
        request_type: &str,
    ) -> Result<Option<EmailVerificationCode>, ApiError> {
        let row = sqlx::query_as::<_, EmailVerificationCode>(
            "SELECT id, user_id, code, request_type, expires_at, created_at \
             FROM email_verification_codes WHERE code = ? AND request_type = ?",
        )
        .bind(code)
        .bind(request_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM email_verification_codes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
