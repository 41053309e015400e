use anyhow::Context;
use async_trait::async_trait;

use super::AuthProvider;

pub struct HostedAuthProvider {
    base_url: String,
    service_key: String,
    client: reqwest::Client,
}

impl HostedAuthProvider {
    pub fn new(base_url: String, service_key: String) -> Self {
        Self {
            base_url,
            service_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AuthProvider for HostedAuthProvider {
    async fn create_user(&self, email: &str, password: &str) -> anyhow::Result<String> {
        let url = format!("{}/admin/users", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await
            .context("failed to reach auth service")?
            .error_for_status()
            .context("auth service rejected user creation")?;

        let body: serde_json::Value = response
            .json()
            .await
            .context("invalid response from auth service")?;

        body.get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .context("auth service response missing user id")
    }

    async fn delete_user(&self, user_id: &str) -> anyhow::Result<()> {
        let url = format!("{}/admin/users/{}", self.base_url, user_id);

        self.client
            .delete(&url)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .context("failed to reach auth service")?
            .error_for_status()
            .context("auth service rejected user deletion")?;

        Ok(())
    }

    async fn set_password(&self, user_id: &str, new_password: &str) -> anyhow::Result<()> {
        let url = format!("{}/admin/users/{}", self.base_url, user_id);

        self.client
            .put(&url)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await
            .context("failed to reach auth service")?
            .error_for_status()
            .context("auth service rejected password update")?;

        Ok(())
    }
}
