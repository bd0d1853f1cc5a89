use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use ulid::Ulid;

use crate::error::ApiError;
use crate::models::Session;

const SESSION_COLUMNS: &str = "id, user_id, ip_address, user_agent, expires_at, last_login_at, \
     created_at, updated_at, deleted_at";

/// Repository for login sessions
#[derive(Clone)]
pub struct SessionRepository {
    pool: MySqlPool,
}

impl SessionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        ip_address: &str,
        user_agent: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, ApiError> {
        let id = Ulid::new().to_string();

        sqlx::query(
            "INSERT INTO sessions (id, user_id, ip_address, user_agent, expires_at, last_login_at) \
             VALUES (?, ?, ?, ?, ?, NOW())",
        )
        .bind(&id)
        .bind(user_id)
        .bind(ip_address)
        .bind(user_agent)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("failed to fetch created session")))
    }

    /// Find by id including soft-deleted rows (deletion still needs the
    /// owning user for the audit entry).
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Session>, ApiError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn find_live_by_id(&self, id: &str) -> Result<Option<Session>, ApiError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Session>, ApiError> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE user_id = ? AND deleted_at IS NULL ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn soft_delete(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE sessions SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn update_last_login(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE sessions SET last_login_at = NOW() WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
