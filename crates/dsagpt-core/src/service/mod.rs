//! Remote services the chat talks to.
//!
//! The orchestrator only sees these traits, so tests and alternative backends
//! can stand in for the HTTP clients.

pub mod account;
pub mod inference;

pub use account::AccountClient;
pub use inference::InferenceClient;

use async_trait::async_trait;
use reqwest::Response;

use crate::error::ServiceError;
use crate::state::{Exchange, Identity};

/// Answers one user message
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn ask(&self, message: &str) -> Result<String, ServiceError>;
}

/// Stores completed exchanges
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    async fn save_exchange(&self, exchange: &Exchange) -> Result<(), ServiceError>;
}

/// Resolves who is signed in
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn current_user(&self) -> Result<Identity, ServiceError>;
}

/// Turn a non-2xx response into a `ServiceError::Status`
async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status { status, body })
}

/// Join a base URL and an absolute path without doubling the slash
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
