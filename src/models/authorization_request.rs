use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Pending authorization-code flow.
///
/// Invariant: a non-null `code` implies `is_consented` and a non-null
/// `session_id`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuthorizationRequest {
    pub id: String,
    pub application_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub scope: String,
    pub state: Option<String>,
    pub nonce: Option<String>,
    pub prompt: String,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub code: Option<String>,
    pub is_consented: bool,
    pub session_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
