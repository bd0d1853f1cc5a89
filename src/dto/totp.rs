use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ProvisionTotpRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ProvisionTotpResponse {
    /// Base32 TOTP secret
    pub secret: String,
    /// otpauth:// provisioning URI for authenticator apps
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTotpRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyTotpResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct DisableTotpRequest {
    pub password: String,
}
