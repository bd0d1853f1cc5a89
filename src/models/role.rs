use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// RBAC role carrying a permission bitmask.
#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub permission_bitmask: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
