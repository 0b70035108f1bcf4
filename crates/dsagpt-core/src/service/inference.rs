use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{endpoint, ensure_success, InferenceService};
use crate::error::ServiceError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

/// Client for the tutoring model's `/chat` endpoint
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    base_url: String,
}

impl InferenceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

/// Pull the reply text out of a `/chat` response body
fn parse_reply(body: &str) -> Result<String, ServiceError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    if parsed.response.trim().is_empty() {
        return Err(ServiceError::Malformed("empty response".to_string()));
    }
    Ok(parsed.response)
}

#[async_trait]
impl InferenceService for InferenceClient {
    async fn ask(&self, message: &str) -> Result<String, ServiceError> {
        let url = endpoint(&self.base_url, "/chat");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let body = response.text().await?;
        parse_reply(&body)
    }
}
