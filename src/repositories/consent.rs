use sqlx::{MySql, MySqlPool, QueryBuilder};
use ulid::Ulid;

use crate::error::ApiError;
use crate::models::Consent;
use crate::utils::scope::{compare_scopes, merge_scopes};

const CONSENT_COLUMNS: &str = "id, user_id, application_id, scope, created_at, updated_at";

/// Repository for consent rows.
///
/// The table carries a unique key on (user_id, application_id); rows are
/// hard-deleted so the key holds exactly for live consents.
#[derive(Clone)]
pub struct ConsentRepository {
    pool: MySqlPool,
}

impl ConsentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Consent>, ApiError> {
        let consent = sqlx::query_as::<_, Consent>(&format!(
            "SELECT {CONSENT_COLUMNS} FROM consents WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(consent)
    }

    pub async fn find_by_user_and_app(
        &self,
        user_id: &str,
        application_id: &str,
    ) -> Result<Option<Consent>, ApiError> {
        let consent = sqlx::query_as::<_, Consent>(&format!(
            "SELECT {CONSENT_COLUMNS} FROM consents WHERE user_id = ? AND application_id = ?"
        ))
        .bind(user_id)
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(consent)
    }

    /// Create or widen the consent for (user, application) so its scope is
    /// the union of the existing scope and `scope`.
    ///
    /// Runs in a transaction holding a row-level write lock. A concurrent
    /// insert loses the race on the unique key and retries once by
    /// re-selecting under the same lock and merging.
    pub async fn upsert_merge(
        &self,
        user_id: &str,
        application_id: &str,
        scope: &str,
    ) -> Result<Consent, ApiError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Consent>(&format!(
            "SELECT {CONSENT_COLUMNS} FROM consents \
             WHERE user_id = ? AND application_id = ? FOR UPDATE"
        ))
        .bind(user_id)
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?;

        let id = match existing {
            Some(consent) => {
                Self::merge_locked(&mut tx, &consent, scope).await?;
                consent.id
            }
            None => {
                let id = Ulid::new().to_string();
                let inserted = sqlx::query(
                    "INSERT INTO consents (id, user_id, application_id, scope) VALUES (?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(user_id)
                .bind(application_id)
                .bind(scope)
                .execute(&mut *tx)
                .await;

                match inserted {
                    Ok(_) => id,
                    Err(e) if is_unique_violation(&e) => {
                        // Another request inserted first; take the lock on its
                        // row and merge into it.
                        let consent = sqlx::query_as::<_, Consent>(&format!(
                            "SELECT {CONSENT_COLUMNS} FROM consents \
                             WHERE user_id = ? AND application_id = ? FOR UPDATE"
                        ))
                        .bind(user_id)
                        .bind(application_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .ok_or_else(|| {
                            ApiError::Internal(anyhow::anyhow!(
                                "consent vanished after unique-key conflict"
                            ))
                        })?;

                        Self::merge_locked(&mut tx, &consent, scope).await?;
                        consent.id
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let consent = sqlx::query_as::<_, Consent>(&format!(
            "SELECT {CONSENT_COLUMNS} FROM consents WHERE id = ?"
        ))
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(consent)
    }

    async fn merge_locked(
        tx: &mut sqlx::Transaction<'_, MySql>,
        consent: &Consent,
        scope: &str,
    ) -> Result<(), ApiError> {
        if compare_scopes(&consent.scope, scope) {
            return Ok(());
        }
        let merged = merge_scopes(&consent.scope, scope);
        sqlx::query("UPDATE consents SET scope = ? WHERE id = ?")
            .bind(&merged)
            .bind(&consent.id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// List consents, optionally filtered by user, application and scope.
    pub async fn list(
        &self,
        user_id: Option<&str>,
        application_id: Option<&str>,
        scope: Option<&str>,
    ) -> Result<Vec<Consent>, ApiError> {
        let mut query = QueryBuilder::<MySql>::new(format!(
            "SELECT {CONSENT_COLUMNS} FROM consents WHERE 1 = 1"
        ));
        if let Some(user_id) = user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(application_id) = application_id {
            query.push(" AND application_id = ").push_bind(application_id);
        }
        if let Some(scope) = scope {
            query.push(" AND scope = ").push_bind(scope);
        }

        let consents = query
            .build_query_as::<Consent>()
            .fetch_all(&self.pool)
            .await?;

        Ok(consents)
    }

    pub async fn create(
        &self,
        user_id: &str,
        application_id: &str,
        scope: &str,
    ) -> Result<Consent, ApiError> {
        let id = Ulid::new().to_string();
        sqlx::query("INSERT INTO consents (id, user_id, application_id, scope) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(user_id)
            .bind(application_id)
            .bind(scope)
            .execute(&self.pool)
            .await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("failed to fetch created consent")))
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM consents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("consent"));
        }

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
