use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::config::AppState;
use crate::error::ApiError;
use crate::models::AuthorizationRequest;
use crate::permissions::required_for_scopes;
use crate::repositories::{AuthorizationRequestRepository, RoleRepository};
use crate::services::SessionService;

use super::authorization::complete_consent;
use super::bearer_token;

/// GET /internal/auth-requests/:id: the stored request, for the consent UI.
pub async fn auth_request_get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuthorizationRequest>, ApiError> {
    let repo = AuthorizationRequestRepository::new(state.pool.clone());
    let auth_req = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid auth_request_id".to_string()))?;

    Ok(Json(auth_req))
}

#[derive(Debug, Serialize)]
pub struct ConsentedResponse {
    pub auth_request_id: String,
}

/// POST /internal/auth-requests/:id/consented
///
/// Called by the consent UI with the user's session JWT. Checks that the
/// user's roles cover the permissions the requested scopes demand, then
/// closes the consent step and issues the authorization code.
pub async fn auth_request_consented_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ConsentedResponse>, ApiError> {
    let repo = AuthorizationRequestRepository::new(state.pool.clone());
    let auth_req = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid auth_request_id".to_string()))?;

    let token = bearer_token(&headers).ok_or(ApiError::InvalidToken)?;
    let sessions = SessionService::new(state.pool.clone(), state.config.clone(), state.keys.clone());
    let (session_id, user_id) = sessions.validate_session_jwt(token)?;

    let required = required_for_scopes(&auth_req.scope);
    if !required.is_none() {
        let roles = RoleRepository::new(state.pool.clone());
        let granted = roles.user_permissions(&user_id).await?;
        if !granted.has(required) {
            return Err(ApiError::Forbidden);
        }
    }

    complete_consent(&state, &auth_req, &session_id, &user_id, &auth_req.scope).await?;

    Ok(Json(ConsentedResponse {
        auth_request_id: auth_req.id,
    }))
}
