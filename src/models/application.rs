use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// OAuth client. The id doubles as the client_id.
#[derive(Debug, Clone, FromRow)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub client_secret: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
