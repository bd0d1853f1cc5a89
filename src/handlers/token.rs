use axum::{
    extract::State,
    http::{header, HeaderMap},
    Form, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;

use crate::config::AppState;
use crate::dto::oauth::{TokenRequest, TokenResponse};
use crate::error::ApiError;
use crate::repositories::{
    ApplicationRepository, AuthorizationRequestRepository, ConsentRepository, SessionRepository,
};
use crate::services::token::TOKEN_RESPONSE_EXPIRES_IN;
use crate::services::TokenService;
use crate::utils::constant_time_compare;
use crate::utils::pkce::verify_pkce;

/// POST /token
///
/// Supports the authorization_code and refresh_token grants. Client
/// authentication (Basic header or form fields) is required for both.
pub async fn token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(req): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    match req.grant_type.as_str() {
        "authorization_code" => {
            authenticate_client(&state, &headers, &req).await?;
            handle_authorization_code_grant(&state, &req).await
        }
        "refresh_token" => {
            authenticate_client(&state, &headers, &req).await?;
            handle_refresh_token_grant(&state, &req).await
        }
        _ => Err(ApiError::UnsupportedGrantType),
    }
}

/// Verify client credentials from the Basic Authorization header when
/// present, otherwise from the form fields. Both the id and the secret are
/// compared constant-time against the Application row.
async fn authenticate_client(
    state: &AppState,
    headers: &HeaderMap,
    req: &TokenRequest,
) -> Result<(), ApiError> {
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "));

    let (client_id, client_secret) = match basic {
        Some(encoded) => parse_basic_auth(encoded)?,
        None => (req.client_id.clone(), req.client_secret.clone()),
    };

    let applications = ApplicationRepository::new(state.pool.clone());
    let application = applications
        .find_by_id(&client_id)
        .await?
        .ok_or(ApiError::InvalidClient)?;

    let id_ok = constant_time_compare(&application.id, &client_id);
    let secret_ok = constant_time_compare(&application.client_secret, &client_secret);
    if !(id_ok && secret_ok) {
        return Err(ApiError::InvalidClient);
    }

    Ok(())
}

fn parse_basic_auth(encoded: &str) -> Result<(String, String), ApiError> {
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| ApiError::InvalidClient)?;
    let decoded = String::from_utf8(decoded).map_err(|_| ApiError::InvalidClient)?;

    // Split at the first colon; the secret may contain more of them.
    let (client_id, client_secret) = decoded
        .split_once(':')
        .ok_or(ApiError::InvalidClient)?;

    Ok((client_id.to_string(), client_secret.to_string()))
}

async fn handle_authorization_code_grant(
    state: &AppState,
    req: &TokenRequest,
) -> Result<Json<TokenResponse>, ApiError> {
    if req.code.is_empty() {
        return Err(ApiError::BadRequest("invalid authorization code".to_string()));
    }

    let auth_requests = AuthorizationRequestRepository::new(state.pool.clone());
    let auth_req = auth_requests
        .find_by_code(&req.code)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid authorization code".to_string()))?;

    if auth_req.redirect_uri != req.redirect_uri {
        return Err(ApiError::BadRequest("redirect_uri does not match".to_string()));
    }

    // The code window was narrowed when consent was given.
    if auth_req.expires_at <= Utc::now() {
        return Err(ApiError::InvalidGrant("authorization_code_expired".to_string()));
    }

    if let Some(challenge) = auth_req.code_challenge.as_deref().filter(|c| !c.is_empty()) {
        if req.code_verifier.is_empty() {
            return Err(ApiError::InvalidGrant("pkce_verification_failed".to_string()));
        }
        if !verify_pkce(
            &req.code_verifier,
            challenge,
            auth_req.code_challenge_method.as_deref(),
        ) {
            return Err(ApiError::InvalidGrant("pkce_verification_failed".to_string()));
        }
    }

    let session_id = auth_req
        .session_id
        .as_deref()
        .filter(|sid| !sid.is_empty())
        .ok_or_else(|| ApiError::BadRequest("invalid session".to_string()))?;

    let sessions = SessionRepository::new(state.pool.clone());
    let session = sessions
        .find_live_by_id(session_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid session".to_string()))?;

    let consents = ConsentRepository::new(state.pool.clone());
    let consent = consents
        .find_by_user_and_app(&session.user_id, &auth_req.application_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid consent".to_string()))?;

    // One redemption per code: the UPDATE clears it, and a lost race means
    // someone else already redeemed.
    if !auth_requests.consume_code(&auth_req.id, &req.code).await? {
        return Err(ApiError::BadRequest("invalid authorization code".to_string()));
    }

    let tokens = TokenService::new(state.pool.clone(), state.config.clone(), state.keys.clone());
    let issued = tokens
        .generate_tokens(&consent, &auth_req.scope, auth_req.nonce.as_deref())
        .await?;

    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: "Bearer",
        expires_in: TOKEN_RESPONSE_EXPIRES_IN,
        refresh_token: issued.refresh_token,
        id_token: issued.id_token,
    }))
}

async fn handle_refresh_token_grant(
    state: &AppState,
    req: &TokenRequest,
) -> Result<Json<TokenResponse>, ApiError> {
    if req.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("invalid refresh token".to_string()));
    }

    let tokens = TokenService::new(state.pool.clone(), state.config.clone(), state.keys.clone());
    let claims = tokens.decrypt_refresh(&req.refresh_token)?;

    let token_set = tokens
        .find_token_set_by_refresh_jti(&claims.jti)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid refresh token".to_string()))?;

    let consents = ConsentRepository::new(state.pool.clone());
    let consent = consents
        .find_by_id(&token_set.consent_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid consent".to_string()))?;

    // Reissue with the scope frozen into the refresh token; no nonce on
    // refresh. The prior token set stays live (no rotation).
    let issued = tokens.generate_tokens(&consent, &claims.scope, None).await?;

    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: "Bearer",
        expires_in: TOKEN_RESPONSE_EXPIRES_IN,
        refresh_token: issued.refresh_token,
        id_token: issued.id_token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_auth() {
        let encoded = STANDARD.encode("client123:s3cret");
        let (id, secret) = parse_basic_auth(&encoded).unwrap();
        assert_eq!(id, "client123");
        assert_eq!(secret, "s3cret");
    }

    #[test]
    fn test_parse_basic_auth_secret_may_contain_colons() {
        let encoded = STANDARD.encode("client:sec:ret");
        let (id, secret) = parse_basic_auth(&encoded).unwrap();
        assert_eq!(id, "client");
        assert_eq!(secret, "sec:ret");
    }

    #[test]
    fn test_parse_basic_auth_rejects_garbage() {
        assert!(parse_basic_auth("not-base64!!").is_err());

        let no_colon = STANDARD.encode("clientonly");
        assert!(parse_basic_auth(&no_colon).is_err());
    }
}
