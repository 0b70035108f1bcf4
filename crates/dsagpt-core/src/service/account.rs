use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder};

use super::{endpoint, ensure_success, HistoryBackend, IdentityService};
use crate::error::ServiceError;
use crate::state::{Exchange, Identity};

/// Client for the account service: identity, chat history, logout.
///
/// Requests carry the session credentials. Cookies the service sets are kept
/// in the client's cookie store; a configured session cookie is sent as well.
#[derive(Clone)]
pub struct AccountClient {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl AccountClient {
    pub fn new(
        base_url: &str,
        session_cookie: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            session_cookie,
        })
    }

    fn with_credentials(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }

    /// End the session on the account service
    pub async fn logout(&self) -> Result<(), ServiceError> {
        let url = endpoint(&self.base_url, "/api/logout");
        let response = self
            .with_credentials(self.client.post(&url).json(&serde_json::json!({})))
            .send()
            .await?;
        ensure_success(response).await?;
        tracing::info!("Logged out");
        Ok(())
    }
}

#[async_trait]
impl HistoryBackend for AccountClient {
    async fn save_exchange(&self, exchange: &Exchange) -> Result<(), ServiceError> {
        let url = endpoint(&self.base_url, "/api/chat");
        let response = self
            .with_credentials(self.client.post(&url).json(exchange))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityService for AccountClient {
    async fn current_user(&self) -> Result<Identity, ServiceError> {
        let url = endpoint(&self.base_url, "/api/me");
        let response = self.with_credentials(self.client.get(&url)).send().await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}
