use sqlx::MySqlPool;

use crate::error::ApiError;
use crate::permissions::{Permission, ADMIN, NONE};

/// Repository for role lookups used by permission checks
#[derive(Clone)]
pub struct RoleRepository {
    pool: MySqlPool,
}

impl RoleRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// A user's effective permissions: bitwise OR across the masks of all
    /// their roles. Any role with the ADMIN sentinel wins outright.
    pub async fn user_permissions(&self, user_id: &str) -> Result<Permission, ApiError> {
        let masks = sqlx::query_scalar::<_, i64>(
            "SELECT r.permission_bitmask FROM roles r \
             INNER JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if masks.iter().any(|mask| Permission(*mask) == ADMIN) {
            return Ok(ADMIN);
        }

        Ok(masks
            .into_iter()
            .fold(NONE, |acc, mask| acc.union(Permission(mask))))
    }
}
