use axum::{
    extract::{Path, State},
    Json,
};

use crate::config::AppState;
use crate::dto::totp::{
    DisableTotpRequest, ProvisionTotpRequest, ProvisionTotpResponse, VerifyTotpRequest,
    VerifyTotpResponse,
};
use crate::dto::MessageResponse;
use crate::error::ApiError;
use crate::repositories::UserRepository;
use crate::services::TotpService;

fn totp_service(state: &AppState) -> TotpService {
    TotpService::new(
        UserRepository::new(state.pool.clone()),
        state.config.app_name.clone(),
    )
}

/// POST /internal/totp/:uid
///
/// Re-authenticates with the password, generates a secret and returns it
/// with the otpauth URI. TOTP is not enabled until a code is verified.
pub async fn totp_provision_handler(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(req): Json<ProvisionTotpRequest>,
) -> Result<Json<ProvisionTotpResponse>, ApiError> {
    let provisioned = totp_service(&state).provision(&uid, &req.password).await?;

    Ok(Json(ProvisionTotpResponse {
        secret: provisioned.secret,
        uri: provisioned.uri,
    }))
}

/// POST /internal/totp/:uid/verify
pub async fn totp_verify_handler(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(req): Json<VerifyTotpRequest>,
) -> Result<Json<VerifyTotpResponse>, ApiError> {
    let valid = totp_service(&state).verify_setup(&uid, &req.code).await?;

    Ok(Json(VerifyTotpResponse { valid }))
}

/// POST /internal/totp/:uid/disable
pub async fn totp_disable_handler(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(req): Json<DisableTotpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    totp_service(&state).disable(&uid, &req.password).await?;

    Ok(Json(MessageResponse::new("TOTP disabled successfully")))
}
