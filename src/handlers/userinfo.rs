use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};

use crate::config::AppState;
use crate::dto::oauth::UserInfoResponse;
use crate::error::ApiError;
use crate::repositories::UserRepository;
use crate::services::TokenService;
use crate::utils::scope::contains_scope;

/// GET /userinfo
///
/// Validates the bearer access token and returns the user's claims filtered
/// by the token's scope, mirroring the conditional ID-token claims.
pub async fn userinfo_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserInfoResponse>, ApiError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing access token".to_string()))?;

    let tokens = TokenService::new(state.pool.clone(), state.config.clone(), state.keys.clone());
    let context = tokens.validate_access_token(raw).await?;

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_active_by_id(&context.sub)
        .await?
        .ok_or_else(|| ApiError::BadRequest("user not found".to_string()))?;
    let profile = users
        .find_profile(&context.sub)
        .await?
        .ok_or_else(|| ApiError::BadRequest("profile not found".to_string()))?;

    let email_scope = contains_scope(&context.scope, "email");
    let profile_scope = contains_scope(&context.scope, "profile");

    Ok(Json(UserInfoResponse {
        sub: user.id,
        name: profile.display_name,
        bio: profile.bio.unwrap_or_default(),
        preferred_username: user.custom_id,
        email: if email_scope { user.email } else { String::new() },
        email_verified: email_scope && user.email_verified,
        birthdate: if profile_scope {
            profile
                .birthdate
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        } else {
            String::new()
        },
        website: if profile_scope {
            profile.website_url
        } else {
            String::new()
        },
        twitter: if profile_scope {
            profile.twitter_handle
        } else {
            String::new()
        },
        affiliation_period: user.affiliation_period,
        updated_at: profile.updated_at.timestamp(),
    }))
}
