use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::config::AppState;
use crate::dto::session::{
    SessionResponse, SessionVerifyQuery, SessionVerifyResponse, SessionsListQuery,
    TokenVerifyQuery, TokenVerifyResponse, UpdateLastLoginRequest,
};
use crate::error::ApiError;
use crate::models::AuditAction;
use crate::repositories::{OauthTokenRepository, SessionRepository};
use crate::services::{AuditSink, SessionService};

/// GET /internal/sessions?user_id=
pub async fn sessions_list_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionsListQuery>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let repo = SessionRepository::new(state.pool.clone());
    let sessions = repo.list_by_user(&query.user_id).await?;

    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

/// GET /internal/sessions/:sid
pub async fn session_get_handler(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let repo = SessionRepository::new(state.pool.clone());
    let session = repo
        .find_live_by_id(&sid)
        .await?
        .ok_or(ApiError::NotFound("session"))?;

    Ok(Json(SessionResponse::from(session)))
}

/// DELETE /internal/sessions/:sid
///
/// Soft-deletes and answers 204 whether or not the session existed; the
/// deletion is audited either way.
pub async fn session_delete_handler(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = SessionRepository::new(state.pool.clone());
    let audit = AuditSink::new(state.pool.clone());

    let session = repo.find_by_id(&sid).await?;
    repo.soft_delete(&sid).await?;

    audit
        .record(
            AuditAction::Delete,
            format!("sessions/{}", sid),
            session.map(|s| s.user_id),
            None,
            Some(sid.clone()),
            json!({ "status": StatusCode::NO_CONTENT.as_u16() }),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /internal/session_verify?session_jwt=
///
/// Always 200; `valid` reports whether the JWT checks out AND the session
/// row is live and unexpired.
pub async fn session_verify_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionVerifyQuery>,
) -> Result<Json<SessionVerifyResponse>, ApiError> {
    let sessions = SessionService::new(state.pool.clone(), state.config.clone(), state.keys.clone());

    let response = match sessions.verify_session(&query.session_jwt).await? {
        Some(session) => SessionVerifyResponse {
            valid: true,
            expires_at: Some(session.expires_at),
        },
        None => SessionVerifyResponse {
            valid: false,
            expires_at: None,
        },
    };

    Ok(Json(response))
}

/// POST /internal/update_last_logined
pub async fn update_last_logined_handler(
    State(state): State<AppState>,
    Json(req): Json<UpdateLastLoginRequest>,
) -> Result<StatusCode, ApiError> {
    let repo = SessionRepository::new(state.pool.clone());

    let session = repo
        .find_live_by_id(&req.sid)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid session id".to_string()))?;

    repo.update_last_login(&session.id).await?;

    Ok(StatusCode::CREATED)
}

/// GET /internal/token_verify?jti=
pub async fn token_verify_handler(
    State(state): State<AppState>,
    Query(query): Query<TokenVerifyQuery>,
) -> Result<Json<TokenVerifyResponse>, ApiError> {
    let repo = OauthTokenRepository::new(state.pool.clone());

    repo.find_live_by_access_jti(&query.jti)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid token".to_string()))?;

    Ok(Json(TokenVerifyResponse { valid: true }))
}
