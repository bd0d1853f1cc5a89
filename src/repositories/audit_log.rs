use sqlx::MySqlPool;
use ulid::Ulid;

use crate::models::AuditEntry;

/// Repository for the append-only audit table
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: MySqlPool,
}

impl AuditLogRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Append one entry. Errors bubble to the sink, which only logs them.
    pub async fn insert(&self, entry: &AuditEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO audit_logs \
             (id, user_id, application_id, session_id, action, target_resource, trusted, details) \
             VALUES (?, ?, ?, ?, ?, ?, FALSE, ?)",
        )
        .bind(Ulid::new().to_string())
        .bind(entry.user_id.as_deref())
        .bind(entry.application_id.as_deref())
        .bind(entry.session_id.as_deref())
        .bind(entry.action.as_str())
        .bind(&entry.target_resource)
        .bind(entry.details.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
