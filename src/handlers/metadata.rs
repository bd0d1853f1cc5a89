use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::AppState;
use crate::dto::oauth::OpenIdConfiguration;
use crate::keys::Jwk;

/// GET /.well-known/openid-configuration
pub async fn openid_configuration_handler(
    State(state): State<AppState>,
) -> Json<OpenIdConfiguration> {
    let issuer = state.config.issuer_base().to_string();

    Json(OpenIdConfiguration {
        authorization_endpoint: format!("{}/authorization", issuer),
        token_endpoint: format!("{}/token", issuer),
        userinfo_endpoint: format!("{}/userinfo", issuer),
        revocation_endpoint: format!("{}/revocation", issuer),
        jwks_uri: format!("{}/.well-known/jwks.json", issuer),
        issuer,
        response_types_supported: vec!["code"],
        subject_types_supported: vec!["public"],
        id_token_signing_alg_values_supported: vec!["RS256"],
        scopes_supported: state.config.allowed_scopes.clone(),
        token_endpoint_auth_methods_supported: vec!["client_secret_basic", "client_secret_post"],
        claims_supported: vec![
            "sub",
            "iss",
            "aud",
            "exp",
            "iat",
            "name",
            "preferred_username",
            "email",
            "email_verified",
            "website",
            "birthdate",
            "updated_at",
        ],
        code_challenge_methods_supported: vec!["S256"],
        grant_types_supported: vec!["authorization_code", "refresh_token"],
    })
}

#[derive(Serialize)]
pub struct JwksResponse {
    pub keys: Vec<Jwk>,
}

/// GET /.well-known/jwks.json
pub async fn jwks_handler(State(state): State<AppState>) -> Json<JwksResponse> {
    Json(JwksResponse {
        keys: state.keys.jwks(),
    })
}
