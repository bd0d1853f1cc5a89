use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use ulid::Ulid;

use crate::error::ApiError;
use crate::models::AuthorizationRequest;

const AUTH_REQUEST_COLUMNS: &str = "id, application_id, redirect_uri, response_type, scope, state, \
     nonce, prompt, code_challenge, code_challenge_method, code, is_consented, session_id, \
     expires_at, created_at, updated_at";

/// Fields captured from the client at the authorization endpoint.
pub struct NewAuthorizationRequest<'a> {
    pub application_id: &'a str,
    pub redirect_uri: &'a str,
    pub response_type: &'a str,
    pub scope: &'a str,
    pub state: Option<&'a str>,
    pub nonce: Option<&'a str>,
    pub prompt: &'a str,
    pub code_challenge: Option<&'a str>,
    pub code_challenge_method: Option<&'a str>,
    pub expires_at: DateTime<Utc>,
}

/// Repository for authorization-code flow state
#[derive(Clone)]
pub struct AuthorizationRequestRepository {
    pool: MySqlPool,
}

impl AuthorizationRequestRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a new request and return it. The id is generated here so no
    /// created_at-ordered re-select is needed.
    pub async fn create(
        &self,
        request: NewAuthorizationRequest<'_>,
    ) -> Result<AuthorizationRequest, ApiError> {
        let id = Ulid::new().to_string();

        sqlx::query(
            "INSERT INTO authorization_requests \
             (id, application_id, redirect_uri, response_type, scope, state, nonce, prompt, \
              code_challenge, code_challenge_method, is_consented, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE, ?)",
        )
        .bind(&id)
        .bind(request.application_id)
        .bind(request.redirect_uri)
        .bind(request.response_type)
        .bind(request.scope)
        .bind(request.state)
        .bind(request.nonce)
        .bind(request.prompt)
        .bind(request.code_challenge)
        .bind(request.code_challenge_method)
        .bind(request.expires_at)
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("failed to fetch created authorization request")))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<AuthorizationRequest>, ApiError> {
        let request = sqlx::query_as::<_, AuthorizationRequest>(&format!(
            "SELECT {AUTH_REQUEST_COLUMNS} FROM authorization_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<AuthorizationRequest>, ApiError> {
        let request = sqlx::query_as::<_, AuthorizationRequest>(&format!(
            "SELECT {AUTH_REQUEST_COLUMNS} FROM authorization_requests WHERE code = ?"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Close the consent step: attach the session, mark consented, store the
    /// generated code and narrow the expiry window.
    pub async fn mark_consented(
        &self,
        id: &str,
        session_id: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE authorization_requests \
             SET is_consented = TRUE, session_id = ?, code = ?, expires_at = ? \
             WHERE id = ?",
        )
        .bind(session_id)
        .bind(code)
        .bind(expires_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Clear the code so it cannot be redeemed twice. Returns false when the
    /// code was already gone (lost race with a concurrent redemption).
    pub async fn consume_code(&self, id: &str, code: &str) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE authorization_requests SET code = NULL WHERE id = ? AND code = ?",
        )
        .bind(id)
        .bind(code)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
