use std::time::Duration;

use serde_json::json;

/// Client for the external mail service.
///
/// Contract: POST `<mail_url>/password-reset` with `{email, name, code}`;
/// anything but HTTP 200 is a failure. Callers treat failures as
/// non-fatal.
#[derive(Clone)]
pub struct MailClient {
    base_url: String,
    client: reqwest::Client,
}

impl MailClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    pub async fn send_password_reset(
        &self,
        email: &str,
        name: &str,
        code: &str,
    ) -> anyhow::Result<()> {
        let url = format!("{}/password-reset", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "email": email,
                "name": name,
                "code": code,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("mail server returned status {}", response.status());
        }

        Ok(())
    }
}
