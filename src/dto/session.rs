use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Session;

#[derive(Debug, Deserialize)]
pub struct SessionsListQuery {
    pub user_id: String,
}

/// Session view returned to the frontend; omits the soft-delete column.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub user_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub expires_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            expires_at: session.expires_at,
            last_login_at: session.last_login_at,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionVerifyQuery {
    pub session_jwt: String,
}

#[derive(Debug, Serialize)]
pub struct SessionVerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLastLoginRequest {
    pub sid: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenVerifyQuery {
    pub jti: String,
}

#[derive(Debug, Serialize)]
pub struct TokenVerifyResponse {
    pub valid: bool,
}
