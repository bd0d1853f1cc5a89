use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// User-level authorization of an application for a scope set.
/// At most one row exists per (user, application).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Consent {
    pub id: String,
    pub user_id: String,
    pub application_id: String,
    pub scope: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
