pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod input;
pub mod orchestrator;
pub mod relay;
pub mod service;
pub mod speech;
pub mod state;
pub mod suggestions;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export main types for convenience
pub use config::Config;
pub use conversation::ConversationStore;
pub use error::{ServiceError, SpeechError};
pub use events::{ChatEvent, EventSender, TurnReply};
pub use input::InputBuffer;
pub use orchestrator::{ChatServices, TurnOrchestrator, TurnSettings};
pub use relay::PersistenceRelay;
pub use service::{
    AccountClient, HistoryBackend, IdentityService, InferenceClient, InferenceService,
};
pub use speech::{CommandRecognizer, Recognizer, SpeechCapture, SpeechUpdate, TranscriptSink};
pub use state::{DictationState, Exchange, Identity, Message, Sender, TurnId, TurnState};
pub use suggestions::SuggestionPanel;
