use serde_json::json;
use sqlx::MySqlPool;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ApiError;
use crate::keys::KeyStore;
use crate::models::AuditAction;
use crate::repositories::UserRepository;
use crate::services::{AuditSink, SessionService, TotpService};
use crate::utils::password::verify_password;

/// Result of a credential check: either a session was issued, or the user
/// still owes a second factor.
pub enum AuthOutcome {
    Session { session_jwt: String },
    RequireMfa,
}

/// Password and TOTP authentication.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionService,
    totp: TotpService,
    audit: AuditSink,
}

impl AuthService {
    pub fn new(pool: MySqlPool, config: Arc<Config>, keys: Arc<KeyStore>) -> Self {
        let users = UserRepository::new(pool.clone());
        Self {
            sessions: SessionService::new(pool.clone(), config.clone(), keys),
            totp: TotpService::new(users.clone(), config.app_name.clone()),
            audit: AuditSink::new(pool),
            users,
        }
    }

    /// Password step. A user with TOTP enrolled gets `RequireMfa` and no
    /// session; everyone else gets a session JWT.
    pub async fn authenticate_password(
        &self,
        username: &str,
        password: &str,
        ip_address: &str,
        user_agent: &str,
        remember: bool,
    ) -> Result<AuthOutcome, ApiError> {
        let user = self
            .users
            .find_active_by_custom_id(username)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        if user.is_totp_enabled {
            return Ok(AuthOutcome::RequireMfa);
        }

        self.open_session(&user.id, ip_address, user_agent, remember)
            .await
    }

    /// TOTP step, after the password step reported `RequireMfa`.
    pub async fn authenticate_totp(
        &self,
        username: &str,
        code: &str,
        ip_address: &str,
        user_agent: &str,
        remember: bool,
    ) -> Result<AuthOutcome, ApiError> {
        let user = self
            .users
            .find_active_by_custom_id(username)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        if !user.is_totp_enabled || user.totp_secret.is_empty() {
            return Err(ApiError::InvalidCredentials);
        }

        if !self.totp.check_code(&user, code)? {
            return Err(ApiError::InvalidCredentials);
        }

        self.open_session(&user.id, ip_address, user_agent, remember)
            .await
    }

    async fn open_session(
        &self,
        user_id: &str,
        ip_address: &str,
        user_agent: &str,
        remember: bool,
    ) -> Result<AuthOutcome, ApiError> {
        let session = self
            .sessions
            .create_session(user_id, ip_address, user_agent, remember)
            .await?;
        let session_jwt = self.sessions.issue_session_jwt(&session)?;

        self.audit
            .record(
                AuditAction::Login,
                format!("sessions/{}", session.id),
                Some(user_id.to_string()),
                None,
                Some(session.id.clone()),
                json!({
                    "ip": ip_address,
                    "user_agent": user_agent,
                    "remember": remember,
                }),
            )
            .await;

        Ok(AuthOutcome::Session { session_jwt })
    }
}
