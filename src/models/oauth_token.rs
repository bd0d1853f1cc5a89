use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A token set issued in one grant: access, refresh and (optionally) ID
/// token JTIs. Revocation soft-deletes the row.
#[derive(Debug, Clone, FromRow)]
pub struct OauthToken {
    pub id: String,
    pub consent_id: String,
    pub access_token_jti: String,
    pub refresh_token_jti: String,
    pub id_token_jti: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
