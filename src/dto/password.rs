use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequestRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub code: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordHashRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordHashResponse {
    pub password_hash: String,
}
