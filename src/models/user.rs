use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

pub const USER_STATUS_ACTIVE: &str = "active";

/// User account. Created externally; this server only updates the password
/// hash (reset flow) and the TOTP fields.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub custom_id: String,
    pub email: String,
    pub external_email: String,
    pub email_verified: bool,
    pub password_hash: String,
    pub status: String,
    pub affiliation_period: String,
    pub totp_secret: String,
    pub is_totp_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 1:1 profile for a user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub website_url: String,
    pub twitter_handle: String,
    pub birthdate: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}
