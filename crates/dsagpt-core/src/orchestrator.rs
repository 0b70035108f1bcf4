//! Turn orchestration.
//!
//! The `TurnOrchestrator` owns every piece of chat state: the conversation,
//! the pending input, the dictation adapter, the suggestion panel, and the
//! turn state machine. Front ends read it and call its operations; they never
//! mutate the pieces directly.
//!
//! A turn runs like this:
//! 1. `submit_turn` appends the user message at once, clears the input, moves
//!    to `AwaitingReply`, and spawns the inference call.
//! 2. The spawned task waits for the reply, holds a successful one back for the
//!    configured minimum delay, then sends a `ChatEvent::Reply`.
//! 3. `handle_event` appends the bot message, returns to `Idle`, and hands the
//!    exchange to the persistence relay without waiting on it.

use std::sync::Arc;
use std::time::Duration;

use crate::conversation::ConversationStore;
use crate::error::SpeechError;
use crate::events::{ChatEvent, EventSender, TurnReply};
use crate::input::InputBuffer;
use crate::relay::PersistenceRelay;
use crate::service::{HistoryBackend, IdentityService, InferenceService};
use crate::speech::{Recognizer, SpeechCapture, SpeechUpdate};
use crate::state::{DictationState, Exchange, Identity, Message, TurnId, TurnState};
use crate::suggestions::SuggestionPanel;

/// The collaborators a conversation needs
pub struct ChatServices {
    pub inference: Arc<dyn InferenceService>,
    pub history: Arc<dyn HistoryBackend>,
    pub identity: Arc<dyn IdentityService>,
    pub recognizer: Box<dyn Recognizer>,
}

#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Minimum time between a successful reply arriving and it being shown
    pub reply_delay: Duration,
    pub suggestions: Vec<String>,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(1000),
            suggestions: SuggestionPanel::default().suggestions().to_vec(),
        }
    }
}

pub struct TurnOrchestrator {
    conversation: ConversationStore,
    input: InputBuffer,
    speech: SpeechCapture,
    suggestions: SuggestionPanel,
    turn: TurnState,
    next_turn: TurnId,
    identity: Option<Identity>,
    inference: Arc<dyn InferenceService>,
    identity_service: Arc<dyn IdentityService>,
    relay: PersistenceRelay,
    reply_delay: Duration,
    events: EventSender,
}

impl TurnOrchestrator {
    pub fn new(services: ChatServices, settings: TurnSettings, events: EventSender) -> Self {
        Self {
            conversation: ConversationStore::new(),
            input: InputBuffer::new(),
            speech: SpeechCapture::new(services.recognizer),
            suggestions: SuggestionPanel::new(settings.suggestions),
            turn: TurnState::Idle,
            next_turn: 1,
            identity: None,
            inference: services.inference,
            identity_service: services.identity,
            relay: PersistenceRelay::new(services.history),
            reply_delay: settings.reply_delay,
            events,
        }
    }

    // Read access

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn suggestions(&self) -> &SuggestionPanel {
        &self.suggestions
    }

    pub fn turn_state(&self) -> &TurnState {
        &self.turn
    }

    /// Whether the "bot is typing" indicator should show
    pub fn is_awaiting_reply(&self) -> bool {
        self.turn.is_awaiting_reply()
    }

    pub fn dictation_state(&self) -> DictationState {
        self.speech.state()
    }

    pub fn speech_supported(&self) -> bool {
        self.speech.is_supported()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    // Turns

    /// Start a turn with the current pending input.
    ///
    /// Does nothing when the trimmed input is empty or a reply is still
    /// awaited. Returns the id of the started turn otherwise.
    pub fn submit_turn(&mut self) -> Option<TurnId> {
        if self.turn.is_awaiting_reply() {
            tracing::debug!("Submit ignored: a reply is still pending");
            return None;
        }
        let text = self.input.text().trim().to_string();
        if text.is_empty() {
            return None;
        }

        let turn = self.next_turn;
        self.next_turn += 1;

        self.conversation.append(Message::user(text.clone()));
        self.input.clear();
        self.speech.reset_transcript();
        self.turn = TurnState::AwaitingReply {
            turn,
            prompt: text.clone(),
        };
        tracing::info!(turn, "Turn submitted");

        self.spawn_inference(turn, text);
        Some(turn)
    }

    fn spawn_inference(&self, turn: TurnId, message: String) {
        let inference = Arc::clone(&self.inference);
        let events = self.events.clone();
        let delay = self.reply_delay;

        tokio::spawn(async move {
            let outcome = inference.ask(&message).await;
            if outcome.is_ok() {
                tokio::time::sleep(delay).await;
            }
            if events.send(ChatEvent::Reply(TurnReply { turn, outcome })).is_err() {
                tracing::debug!(turn, "Reply dropped: conversation closed");
            }
        });
    }

    fn finish_turn(&mut self, reply: TurnReply) {
        let prompt = match &self.turn {
            TurnState::AwaitingReply { turn, prompt } if *turn == reply.turn => prompt.clone(),
            _ => {
                tracing::debug!(turn = reply.turn, "Ignoring reply for a turn that is not pending");
                return;
            }
        };
        self.turn = TurnState::Idle;

        match reply.outcome {
            Ok(text) => {
                self.conversation.append(Message::bot(text.clone()));
                tracing::info!(turn = reply.turn, "Reply received");
                self.persist(Exchange {
                    user_message: prompt,
                    bot_message: text,
                    user_id: self.identity.as_ref().map(|i| i.id.clone()),
                });
            }
            Err(e) => {
                // No reply is shown; the user's message stays in the log
                tracing::warn!(turn = reply.turn, error = %e, "Inference call failed");
            }
        }
    }

    /// Fire-and-forget. Nothing here waits on the write.
    fn persist(&self, exchange: Exchange) {
        self.relay.record(exchange);
    }

    /// Feed back an event produced by spawned work
    pub fn handle_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Reply(reply) => self.finish_turn(reply),
            ChatEvent::Transcript { session, update } => self.apply_transcript(session, update),
            ChatEvent::Identity(identity) => {
                if let Some(identity) = &identity {
                    tracing::info!(user_id = %identity.id, "Identity resolved");
                }
                self.identity = identity;
            }
        }
    }

    // Input

    /// Mutable access to the input for manual edits.
    ///
    /// `None` while dictation is listening: the transcript owns the input then.
    pub fn edit_input(&mut self) -> Option<&mut InputBuffer> {
        if self.speech.is_listening() {
            None
        } else {
            Some(&mut self.input)
        }
    }

    pub fn focus_input(&mut self) {
        self.input.focus();
    }

    pub fn blur_input(&mut self) {
        self.input.blur();
    }

    // Dictation

    pub fn start_dictation(&mut self) -> Result<(), SpeechError> {
        self.speech.start(&self.events)?;
        self.input.set(self.speech.transcript());
        Ok(())
    }

    pub fn stop_dictation(&mut self) {
        self.speech.stop();
    }

    pub fn toggle_dictation(&mut self) -> Result<DictationState, SpeechError> {
        if self.speech.is_listening() {
            self.stop_dictation();
        } else {
            self.start_dictation()?;
        }
        Ok(self.speech.state())
    }

    fn apply_transcript(&mut self, session: u64, update: SpeechUpdate) {
        if self.speech.apply(session, update) {
            self.input.set(self.speech.transcript());
        }
    }

    // Suggestions

    pub fn toggle_suggestions(&mut self) {
        self.suggestions.toggle();
    }

    pub fn hide_suggestions(&mut self) {
        self.suggestions.hide();
    }

    pub fn suggestion_next(&mut self) {
        self.suggestions.select_next();
    }

    pub fn suggestion_prev(&mut self) {
        self.suggestions.select_prev();
    }

    /// Put a suggestion into the input, hide the panel, and focus the input.
    ///
    /// Dictation is stopped first, otherwise the next transcript update would
    /// overwrite the selection.
    pub fn select_suggestion(&mut self, text: &str) {
        self.speech.stop();
        self.input.set(text);
        self.suggestions.hide();
        self.input.focus();
    }

    /// Select whatever the panel has highlighted
    pub fn select_highlighted_suggestion(&mut self) {
        if let Some(text) = self.suggestions.selected().map(str::to_string) {
            self.select_suggestion(&text);
        }
    }

    // Identity

    /// Look up the signed-in user in the background.
    ///
    /// The result arrives as a `ChatEvent::Identity`. A failed lookup leaves
    /// the identity absent and chat keeps working.
    pub fn resolve_identity(&self) {
        let service = Arc::clone(&self.identity_service);
        let events = self.events.clone();
        tokio::spawn(async move {
            let identity = match service.current_user().await {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch user identity");
                    None
                }
            };
            let _ = events.send(ChatEvent::Identity(identity));
        });
    }
}
