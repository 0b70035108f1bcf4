//! Test doubles for the service traits and the dictation capability.
//!
//! These let the orchestrator and front ends be exercised without a network
//! or a microphone.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::mpsc;

use crate::error::{ServiceError, SpeechError};
use crate::service::{HistoryBackend, IdentityService, InferenceService};
use crate::speech::{Recognizer, SpeechUpdate, TranscriptSink};
use crate::state::{Exchange, Identity};

fn unavailable(what: &str) -> ServiceError {
    ServiceError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: what.to_string(),
    }
}

/// Inference service that answers from a queue
#[derive(Default)]
pub struct MockInference {
    replies: Mutex<VecDeque<Result<String, ServiceError>>>,
    requests: Mutex<Vec<String>>,
}

impl MockInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn queue_error(&self, error: ServiceError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Messages the service was asked, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceService for MockInference {
    async fn ask(&self, message: &str) -> Result<String, ServiceError> {
        self.requests.lock().unwrap().push(message.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable("no mock reply queued")))
    }
}

/// History backend that forwards every exchange to a channel
pub struct MockHistory {
    saved: mpsc::UnboundedSender<Exchange>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockHistory {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Exchange>) {
        Self::build(false)
    }

    /// Records the attempt, then fails it
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<Exchange>) {
        Self::build(true)
    }

    fn build(fail: bool) -> (Self, mpsc::UnboundedReceiver<Exchange>) {
        let (saved, rx) = mpsc::unbounded_channel();
        (
            Self {
                saved,
                fail,
                calls: AtomicUsize::new(0),
            },
            rx,
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryBackend for MockHistory {
    async fn save_exchange(&self, exchange: &Exchange) -> Result<(), ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.saved.send(exchange.clone());
        if self.fail {
            Err(unavailable("history backend down"))
        } else {
            Ok(())
        }
    }
}

/// Identity service with a fixed answer; `None` makes the lookup fail
pub struct MockIdentity {
    identity: Option<Identity>,
}

impl MockIdentity {
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn anonymous() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl IdentityService for MockIdentity {
    async fn current_user(&self) -> Result<Identity, ServiceError> {
        self.identity
            .clone()
            .ok_or_else(|| ServiceError::Status {
                status: StatusCode::UNAUTHORIZED,
                body: "not signed in".to_string(),
            })
    }
}

#[derive(Default)]
struct ScriptState {
    sink: Option<TranscriptSink>,
    starts: usize,
    stops: usize,
}

/// Recognizer driven by the test through a [`ScriptHandle`]
pub struct ScriptedRecognizer {
    supported: bool,
    state: Arc<Mutex<ScriptState>>,
}

/// Test-side control of a [`ScriptedRecognizer`]
#[derive(Clone)]
pub struct ScriptHandle {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedRecognizer {
    pub fn new() -> (Self, ScriptHandle) {
        Self::build(true)
    }

    pub fn unsupported() -> (Self, ScriptHandle) {
        Self::build(false)
    }

    fn build(supported: bool) -> (Self, ScriptHandle) {
        let state = Arc::new(Mutex::new(ScriptState::default()));
        (
            Self {
                supported,
                state: Arc::clone(&state),
            },
            ScriptHandle { state },
        )
    }
}

impl Recognizer for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(&mut self, sink: TranscriptSink) -> Result<(), SpeechError> {
        if !self.supported {
            return Err(SpeechError::Unsupported);
        }
        let mut state = self.state.lock().unwrap();
        state.sink = Some(sink);
        state.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.state.lock().unwrap().stops += 1;
    }
}

impl ScriptHandle {
    /// Emit an update as the most recently started session would.
    ///
    /// The sink is kept after stop so tests can simulate late deliveries.
    pub fn emit(&self, update: SpeechUpdate) -> bool {
        match &self.state.lock().unwrap().sink {
            Some(sink) => sink.send(update),
            None => false,
        }
    }

    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }
}
