//! Best-effort persistence of completed exchanges.

use std::sync::Arc;

use crate::service::HistoryBackend;
use crate::state::Exchange;

/// Hands exchanges to the history backend without holding up the chat.
///
/// Each exchange is written at most once from a detached task. Failures are
/// logged and dropped; nothing is retried and nothing is reported back.
#[derive(Clone)]
pub struct PersistenceRelay {
    backend: Arc<dyn HistoryBackend>,
}

impl PersistenceRelay {
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self { backend }
    }

    /// Queue an exchange for writing. Returns immediately.
    pub fn record(&self, exchange: Exchange) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            match backend.save_exchange(&exchange).await {
                Ok(()) => {
                    tracing::debug!(user_id = ?exchange.user_id, "Exchange saved");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to save exchange");
                }
            }
        });
    }
}
