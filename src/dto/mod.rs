pub mod auth;
pub mod consent;
pub mod oauth;
pub mod password;
pub mod session;
pub mod totp;

use serde::Serialize;

/// Generic `{message}` body for endpoints that only acknowledge.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
