use axum::{extract::State, http::StatusCode, Form};

use crate::config::AppState;
use crate::dto::oauth::RevocationRequest;
use crate::error::ApiError;
use crate::repositories::OauthTokenRepository;

/// POST /revocation (RFC 7009)
///
/// The hinted JTI column is tried first; zero affected rows falls back to
/// the other column. With no or an unknown hint both columns are tried.
/// Unknown tokens still answer 200.
pub async fn revocation_handler(
    State(state): State<AppState>,
    Form(req): Form<RevocationRequest>,
) -> Result<StatusCode, ApiError> {
    let repo = OauthTokenRepository::new(state.pool.clone());

    match req.token_type_hint.as_deref() {
        Some("access_token") => {
            if repo.soft_delete_by_access_jti(&req.token).await? == 0 {
                repo.soft_delete_by_refresh_jti(&req.token).await?;
            }
        }
        Some("refresh_token") => {
            if repo.soft_delete_by_refresh_jti(&req.token).await? == 0 {
                repo.soft_delete_by_access_jti(&req.token).await?;
            }
        }
        _ => {
            repo.soft_delete_by_access_jti(&req.token).await?;
            repo.soft_delete_by_refresh_jti(&req.token).await?;
        }
    }

    Ok(StatusCode::OK)
}
