use sqlx::MySqlPool;

use crate::error::ApiError;
use crate::models::Application;

/// Repository for OAuth clients and their registered redirect URIs
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: MySqlPool,
}

impl ApplicationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Application>, ApiError> {
        let application = sqlx::query_as::<_, Application>(
            "SELECT id, name, client_secret, created_at, updated_at, deleted_at \
             FROM applications WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    /// Exact-match check against the stored redirect URI set of a client.
    pub async fn redirect_uri_exists(
        &self,
        application_id: &str,
        uri: &str,
    ) -> Result<bool, ApiError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM redirect_uris WHERE application_id = ? AND uri = ?",
        )
        .bind(application_id)
        .bind(uri)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}
