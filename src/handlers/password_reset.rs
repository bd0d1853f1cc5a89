use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use rand::Rng;

use crate::config::AppState;
use crate::dto::password::{
    PasswordHashRequest, PasswordHashResponse, PasswordResetConfirmRequest,
    PasswordResetRequestRequest,
};
use crate::dto::MessageResponse;
use crate::error::ApiError;
use crate::models::REQUEST_TYPE_PASSWORD_RESET;
use crate::repositories::{EmailVerificationCodeRepository, UserRepository};
use crate::services::MailClient;
use crate::utils::password::hash_password;

const RESET_CODE_LENGTH: usize = 6;
const RESET_CODE_TTL_MINUTES: i64 = 10;

/// Mixed-alphanumeric reset code.
fn generate_reset_code() -> String {
    const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..RESET_CODE_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// POST /internal/password_reset/request
///
/// Always answers 200 with the same message so the endpoint cannot be used
/// to enumerate accounts. Mail failures are logged, never surfaced.
pub async fn password_reset_request_handler(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequestRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.email.is_empty() || !req.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email".to_string()));
    }

    let accepted = MessageResponse::new(
        "A password reset email has been sent. Please check your inbox.",
    );

    let users = UserRepository::new(state.pool.clone());
    let Some(user) = users.find_by_external_email(&req.email).await? else {
        return Ok(Json(accepted));
    };

    let code = generate_reset_code();
    let codes = EmailVerificationCodeRepository::new(state.pool.clone());
    codes
        .create(
            &user.id,
            &code,
            REQUEST_TYPE_PASSWORD_RESET,
            Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES),
        )
        .await?;

    let display_name = users
        .find_profile(&user.id)
        .await?
        .map(|profile| profile.display_name)
        .unwrap_or_default();

    let mail = MailClient::new(&state.config.mail_server_url);
    if let Err(e) = mail
        .send_password_reset(&user.external_email, &display_name, &code)
        .await
    {
        tracing::warn!(error = %e, "failed to send password reset email");
    }

    Ok(Json(accepted))
}

/// POST /internal/password_reset/confirm
pub async fn password_reset_confirm_handler(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let codes = EmailVerificationCodeRepository::new(state.pool.clone());
    let verification = codes
        .find_by_code(&req.code, REQUEST_TYPE_PASSWORD_RESET)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if verification.expires_at <= Utc::now() {
        codes.delete_by_id(&verification.id).await.ok();
        return Err(ApiError::InvalidCredentials);
    }

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_by_id(&verification.user_id)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let password_hash = hash_password(&req.password)?;
    users.update_password_hash(&user.id, &password_hash).await?;

    // The password is already updated; a leftover code is only noise.
    if let Err(e) = codes.delete_by_id(&verification.id).await {
        tracing::warn!(error = %e, "failed to delete used password reset code");
    }

    Ok(Json(MessageResponse::new(
        "Password has been reset. Sign in with the new password.",
    )))
}

/// POST /internal/password_hash
pub async fn password_hash_handler(
    Json(req): Json<PasswordHashRequest>,
) -> Result<Json<PasswordHashResponse>, ApiError> {
    let password_hash = hash_password(&req.password)?;

    Ok(Json(PasswordHashResponse { password_hash }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_code_shape() {
        for _ in 0..32 {
            let code = generate_reset_code();
            assert_eq!(code.len(), RESET_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
