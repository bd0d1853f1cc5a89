use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::ApiError;
use crate::models::User;
use crate::repositories::UserRepository;
use crate::utils::password::verify_password;

const TOTP_DIGITS: usize = 6;
const TOTP_SKEW: u8 = 1;
const TOTP_STEP: u64 = 30;

/// TOTP provisioning and verification (RFC 6238: SHA-1, 6 digits, 30 s step).
#[derive(Clone)]
pub struct TotpService {
    users: UserRepository,
    issuer: String,
}

/// Result of provisioning: the base32 secret and the otpauth:// URI.
pub struct ProvisionedTotp {
    pub secret: String,
    pub uri: String,
}

impl TotpService {
    pub fn new(users: UserRepository, issuer: String) -> Self {
        Self { users, issuer }
    }

    /// Generate and store a secret for a user after re-authenticating them.
    /// TOTP stays disabled until the first code is verified.
    pub async fn provision(&self, user_id: &str, password: &str) -> Result<ProvisionedTotp, ApiError> {
        let user = self.reauthenticate(user_id, password).await?;

        if user.is_totp_enabled {
            return Err(ApiError::BadRequest("TOTP is already enabled".to_string()));
        }

        let secret = Secret::generate_secret();
        let encoded = secret.to_encoded().to_string();
        let totp = self.build_totp(&encoded, &user.custom_id)?;

        self.users.set_totp_secret(&user.id, &encoded).await?;

        Ok(ProvisionedTotp {
            secret: encoded,
            uri: totp.get_url(),
        })
    }

    /// Check a code against the stored secret; the first success enables
    /// TOTP for the account.
    pub async fn verify_setup(&self, user_id: &str, code: &str) -> Result<bool, ApiError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        if user.totp_secret.is_empty() {
            return Err(ApiError::BadRequest("TOTP is not provisioned".to_string()));
        }

        let valid = self.check_code(&user, code)?;
        if valid && !user.is_totp_enabled {
            self.users.enable_totp(&user.id).await?;
        }

        Ok(valid)
    }

    /// Disable TOTP after re-authenticating the user.
    pub async fn disable(&self, user_id: &str, password: &str) -> Result<(), ApiError> {
        let user = self.reauthenticate(user_id, password).await?;

        if !user.is_totp_enabled {
            return Err(ApiError::BadRequest("TOTP is not enabled".to_string()));
        }

        self.users.disable_totp(&user.id).await
    }

    /// Validate a login code for a user with enrolled TOTP.
    pub fn check_code(&self, user: &User, code: &str) -> Result<bool, ApiError> {
        let totp = self.build_totp(&user.totp_secret, &user.custom_id)?;
        totp.check_current(code)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("TOTP clock error: {}", e)))
    }

    fn build_totp(&self, encoded_secret: &str, account: &str) -> Result<TOTP, ApiError> {
        let secret_bytes = Secret::Encoded(encoded_secret.to_string())
            .to_bytes()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("invalid TOTP secret: {:?}", e)))?;

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            secret_bytes,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("TOTP construction failed: {:?}", e)))
    }

    async fn reauthenticate(&self, user_id: &str, password: &str) -> Result<User, ApiError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        let user = self
            .users
            .find_active_by_custom_id(&user.custom_id)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        Ok(user)
    }
}
