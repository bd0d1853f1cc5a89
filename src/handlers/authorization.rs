use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
    Form,
};
use chrono::{Duration, Utc};
use serde_json::json;
use ulid::Ulid;

use crate::config::AppState;
use crate::dto::oauth::{AuthorizeQuery, ConsentForm, ConsentedQuery};
use crate::error::ApiError;
use crate::models::{AuditAction, AuthorizationRequest};
use crate::repositories::authorization_request::NewAuthorizationRequest;
use crate::repositories::{ApplicationRepository, AuthorizationRequestRepository, ConsentRepository};
use crate::services::{AuditSink, SessionService};

use super::{bearer_token, cookie_value, redirect_found, redirect_moved_permanently};

const AUTH_REQUEST_TTL_MINUTES: i64 = 20;
const AUTH_CODE_TTL_MINUTES: i64 = 5;

/// GET /authorization: entry point of the authorization-code flow.
///
/// Validation failures redirect to the frontend with `error=<code>`; on
/// success the pending request is persisted and the user is sent to the
/// frontend consent page.
pub async fn authorize_handler(
    State(state): State<AppState>,
    Query(req): Query<AuthorizeQuery>,
) -> Result<Response, ApiError> {
    // Schema-level checks: these produce a 400 rather than a redirect.
    if req.response_type != "code" && req.response_type != "token" {
        return Err(ApiError::BadRequest("invalid response_type".to_string()));
    }
    if let Some(method) = req.code_challenge_method.as_deref() {
        if method != "plain" && method != "S256" {
            return Err(ApiError::BadRequest(
                "invalid code_challenge_method".to_string(),
            ));
        }
    }

    let frontend = state.config.frontend_base();
    let error_redirect =
        |code: &str| redirect_found(&format!("{}/authorization?error={}", frontend, code));

    let applications = ApplicationRepository::new(state.pool.clone());
    let client = match applications.find_by_id(&req.client_id).await {
        Ok(Some(client)) => client,
        Ok(None) => return Ok(error_redirect("invalid_client")),
        Err(_) => return Ok(error_redirect("internal_server_error")),
    };

    match applications
        .redirect_uri_exists(&client.id, &req.redirect_uri)
        .await
    {
        Ok(true) => {}
        Ok(false) => return Ok(error_redirect("invalid_redirect_uri")),
        Err(_) => return Ok(error_redirect("internal_server_error")),
    }

    // token responses are bound by the schema but not supported.
    if req.response_type != "code" {
        return Ok(error_redirect("unsupported_response_type"));
    }

    let all_allowed = crate::utils::scope::split_scopes(&req.scope)
        .iter()
        .all(|scope| state.config.is_scope_allowed(scope));
    if !all_allowed {
        return Ok(error_redirect("invalid_scope"));
    }

    let prompt = match req.prompt.as_deref() {
        Some(prompt) if !prompt.is_empty() => prompt,
        _ => "none",
    };

    let auth_requests = AuthorizationRequestRepository::new(state.pool.clone());
    let created = auth_requests
        .create(NewAuthorizationRequest {
            application_id: &req.client_id,
            redirect_uri: &req.redirect_uri,
            response_type: &req.response_type,
            scope: &req.scope,
            state: req.state.as_deref(),
            nonce: req.nonce.as_deref(),
            prompt,
            code_challenge: req.code_challenge.as_deref(),
            code_challenge_method: req.code_challenge_method.as_deref(),
            expires_at: Utc::now() + Duration::minutes(AUTH_REQUEST_TTL_MINUTES),
        })
        .await;

    let created = match created {
        Ok(created) => created,
        Err(_) => return Ok(error_redirect("internal_server_error")),
    };

    // Echo the original parameters so the frontend can render the consent
    // page without an extra lookup.
    let mut target = format!(
        "{}/authorization?auth_request_id={}",
        frontend,
        urlencoding::encode(&created.id)
    );
    push_param(&mut target, "client_id", &req.client_id);
    push_param(&mut target, "redirect_uri", &req.redirect_uri);
    push_param(&mut target, "response_type", &req.response_type);
    push_param(&mut target, "scope", &req.scope);
    if let Some(value) = req.state.as_deref() {
        push_param(&mut target, "state", value);
    }
    if let Some(value) = req.nonce.as_deref() {
        push_param(&mut target, "nonce", value);
    }
    if let Some(value) = req.code_challenge.as_deref() {
        push_param(&mut target, "code_challenge", value);
    }
    if let Some(value) = req.code_challenge_method.as_deref() {
        push_param(&mut target, "code_challenge_method", value);
    }

    Ok(redirect_found(&target))
}

fn push_param(target: &mut String, key: &str, value: &str) {
    target.push('&');
    target.push_str(key);
    target.push('=');
    target.push_str(&urlencoding::encode(value));
}

/// POST /authorization: legacy consent submit from the frontend form.
///
/// The session JWT arrives as a Bearer header or a `session_jwt` cookie.
/// Redirects to /consented, which forwards to the client.
pub async fn authorize_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ConsentForm>,
) -> Result<Response, ApiError> {
    if form.auth_request_id.is_empty() {
        return Err(ApiError::BadRequest("invalid authorization request".to_string()));
    }

    let auth_requests = AuthorizationRequestRepository::new(state.pool.clone());
    let auth_req = auth_requests
        .find_by_id(&form.auth_request_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("invalid authorization request".to_string()))?;

    let token = bearer_token(&headers)
        .or_else(|| cookie_value(&headers, "session_jwt"))
        .ok_or(ApiError::InvalidToken)?;

    let sessions = SessionService::new(state.pool.clone(), state.config.clone(), state.keys.clone());
    let (session_id, user_id) = sessions.validate_session_jwt(token)?;

    let scope = if form.scope.is_empty() {
        auth_req.scope.clone()
    } else {
        form.scope.clone()
    };

    complete_consent(&state, &auth_req, &session_id, &user_id, &scope).await?;

    let target = format!(
        "{}/consented?authorization_id={}",
        state.config.issuer_base(),
        urlencoding::encode(&auth_req.id)
    );

    Ok(redirect_moved_permanently(&target))
}

/// Shared consent transition: attach the session, mark the request
/// consented, issue the ULID code, narrow the expiry window and merge the
/// consent record. Returns the generated code.
pub(crate) async fn complete_consent(
    state: &AppState,
    auth_req: &AuthorizationRequest,
    session_id: &str,
    user_id: &str,
    scope: &str,
) -> Result<String, ApiError> {
    if auth_req.response_type != "code" {
        return Err(ApiError::BadRequest("unsupported response_type".to_string()));
    }

    let auth_requests = AuthorizationRequestRepository::new(state.pool.clone());
    let consents = ConsentRepository::new(state.pool.clone());
    let audit = AuditSink::new(state.pool.clone());

    let code = Ulid::new().to_string();
    let expires_at = Utc::now() + Duration::minutes(AUTH_CODE_TTL_MINUTES);

    auth_requests
        .mark_consented(&auth_req.id, session_id, &code, expires_at)
        .await?;

    let consent = consents
        .upsert_merge(user_id, &auth_req.application_id, scope)
        .await?;

    audit
        .record(
            AuditAction::Authorization,
            format!("authorization_requests/{}", auth_req.id),
            Some(user_id.to_string()),
            Some(auth_req.application_id.clone()),
            Some(session_id.to_string()),
            json!({
                "consent_id": consent.id,
                "scope": scope,
            }),
        )
        .await;

    Ok(code)
}

/// GET /consented: forwards a completed authorization to the client's
/// redirect URI with the code (and state, when the client sent one).
pub async fn consented_handler(
    State(state): State<AppState>,
    Query(query): Query<ConsentedQuery>,
) -> Result<Response, ApiError> {
    let auth_requests = AuthorizationRequestRepository::new(state.pool.clone());
    let auth_req = auth_requests
        .find_by_id(&query.authorization_id)
        .await?
        .filter(|req| req.is_consented)
        .ok_or_else(|| ApiError::BadRequest("invalid auth_request_id".to_string()))?;

    if auth_req.response_type != "code" {
        return Err(ApiError::BadRequest("unsupported response_type".to_string()));
    }

    let code = match auth_req.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => return Err(ApiError::BadRequest("not check consented".to_string())),
    };

    let mut target = format!("{}?code={}", auth_req.redirect_uri, urlencoding::encode(code));
    if let Some(state_param) = auth_req.state.as_deref() {
        if !state_param.is_empty() {
            target.push_str("&state=");
            target.push_str(&urlencoding::encode(state_param));
        }
    }

    Ok(redirect_moved_permanently(&target))
}
