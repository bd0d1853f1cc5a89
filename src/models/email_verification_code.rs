use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const REQUEST_TYPE_PASSWORD_RESET: &str = "password_reset";

/// Short-lived code mailed to a user, currently only for password resets.
#[derive(Debug, Clone, FromRow)]
pub struct EmailVerificationCode {
    pub id: String,
    pub user_id: String,
    pub code: String,
    pub request_type: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
