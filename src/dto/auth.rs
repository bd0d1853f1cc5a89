use serde::{Deserialize, Serialize};

/// Body of POST /internal/authentication
#[derive(Debug, Deserialize)]
pub struct AuthenticationRequest {
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(rename = "type")]
    pub auth_type: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthenticationResponse {
    pub session_jwt: String,
}

/// Returned instead of a session when the account has TOTP enrolled.
#[derive(Debug, Serialize)]
pub struct RequireMfaResponse {
    pub require_mfa: bool,
    pub mfa_type: Vec<&'static str>,
}

impl RequireMfaResponse {
    pub fn totp() -> Self {
        Self {
            require_mfa: true,
            mfa_type: vec!["totp"],
        }
    }
}
