use axum::{extract::State, response::IntoResponse, response::Response, Json};

use crate::config::AppState;
use crate::dto::auth::{AuthenticationRequest, AuthenticationResponse, RequireMfaResponse};
use crate::error::ApiError;
use crate::services::auth::AuthOutcome;
use crate::services::AuthService;

/// POST /internal/authentication
///
/// Password or TOTP authentication for the frontend. A password login for a
/// TOTP-enrolled account returns `{require_mfa: true}` without a session.
pub async fn authentication_handler(
    State(state): State<AppState>,
    Json(req): Json<AuthenticationRequest>,
) -> Result<Response, ApiError> {
    let auth = AuthService::new(state.pool.clone(), state.config.clone(), state.keys.clone());

    let outcome = match req.auth_type.as_str() {
        "password" => {
            auth.authenticate_password(
                &req.username,
                &req.password,
                &req.ip_address,
                &req.user_agent,
                req.remember,
            )
            .await?
        }
        "totp" => {
            auth.authenticate_totp(
                &req.username,
                &req.code,
                &req.ip_address,
                &req.user_agent,
                req.remember,
            )
            .await?
        }
        // "mfa" is reserved and not implemented.
        _ => return Err(ApiError::BadRequest("Invalid authentication type".to_string())),
    };

    let response = match outcome {
        AuthOutcome::Session { session_jwt } => {
            Json(AuthenticationResponse { session_jwt }).into_response()
        }
        AuthOutcome::RequireMfa => Json(RequireMfaResponse::totp()).into_response(),
    };

    Ok(response)
}
