use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::config::AppState;
use crate::dto::consent::{ConsentCreateRequest, ConsentListQuery};
use crate::dto::MessageResponse;
use crate::error::ApiError;
use crate::models::Consent;
use crate::repositories::ConsentRepository;

/// GET /internal/consents: list, with optional filters
pub async fn consents_list_handler(
    State(state): State<AppState>,
    Query(query): Query<ConsentListQuery>,
) -> Result<Json<Vec<Consent>>, ApiError> {
    let repo = ConsentRepository::new(state.pool.clone());
    let consents = repo
        .list(
            query.user_id.as_deref(),
            query.application_id.as_deref(),
            query.scope.as_deref(),
        )
        .await?;

    Ok(Json(consents))
}

/// POST /internal/consents
pub async fn consent_create_handler(
    State(state): State<AppState>,
    Json(req): Json<ConsentCreateRequest>,
) -> Result<(StatusCode, Json<Consent>), ApiError> {
    let repo = ConsentRepository::new(state.pool.clone());
    let consent = repo
        .create(&req.user_id, &req.application_id, &req.scope)
        .await?;

    Ok((StatusCode::CREATED, Json(consent)))
}

/// DELETE /internal/consents/:id
pub async fn consent_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = ConsentRepository::new(state.pool.clone());
    repo.delete_by_id(&id).await?;

    Ok(Json(MessageResponse::new("deleted")))
}
