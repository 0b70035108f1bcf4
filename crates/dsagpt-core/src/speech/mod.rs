//! Speech capture adapter.
//!
//! Wraps a continuous dictation capability behind the [`Recognizer`] trait and
//! keeps the live transcript. The adapter never touches the network or the
//! conversation; the orchestrator reads the transcript and mirrors it into the
//! pending input while listening.

pub mod command;

pub use command::CommandRecognizer;

use crate::error::SpeechError;
use crate::events::{ChatEvent, EventSender};
use crate::state::DictationState;

/// One piece of recognized speech
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechUpdate {
    /// Replaces the phrase currently being recognized
    Interim(String),
    /// Commits the current phrase to the transcript
    Final(String),
    /// The capability stopped on its own; nothing more will follow
    Ended,
}

/// Where a recognizer delivers its updates.
///
/// Tagged with the capture session so updates from an earlier session can be
/// told apart from the current one.
#[derive(Debug, Clone)]
pub struct TranscriptSink {
    session: u64,
    events: EventSender,
}

impl TranscriptSink {
    pub fn new(session: u64, events: EventSender) -> Self {
        Self { session, events }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Returns false once nobody is listening for events anymore
    pub fn send(&self, update: SpeechUpdate) -> bool {
        self.events
            .send(ChatEvent::Transcript {
                session: self.session,
                update,
            })
            .is_ok()
    }
}

/// A dictation capability
pub trait Recognizer: Send {
    /// Whether this environment can capture speech at all
    fn is_supported(&self) -> bool;

    /// Begin continuous capture, delivering updates to `sink` until stopped
    fn start(&mut self, sink: TranscriptSink) -> Result<(), SpeechError>;

    fn stop(&mut self);
}

/// Stand-in used when no dictation capability is configured
#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

impl Recognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _sink: TranscriptSink) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop(&mut self) {}
}

pub struct SpeechCapture {
    recognizer: Box<dyn Recognizer>,
    supported: bool,
    state: DictationState,
    session: u64,
    committed: String,
    interim: String,
}

impl std::fmt::Debug for SpeechCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCapture")
            .field("supported", &self.supported)
            .field("state", &self.state)
            .field("session", &self.session)
            .field("committed", &self.committed)
            .field("interim", &self.interim)
            .finish()
    }
}

impl SpeechCapture {
    /// Support is probed here, once; later changes to the environment do not
    /// flip it
    pub fn new(recognizer: Box<dyn Recognizer>) -> Self {
        let supported = recognizer.is_supported();
        Self {
            recognizer,
            supported,
            state: DictationState::Stopped,
            session: 0,
            committed: String::new(),
            interim: String::new(),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == DictationState::Listening
    }

    pub fn start(&mut self, events: &EventSender) -> Result<(), SpeechError> {
        if self.is_listening() {
            return Err(SpeechError::AlreadyListening);
        }
        if !self.supported {
            return Err(SpeechError::Unsupported);
        }

        self.session += 1;
        self.recognizer
            .start(TranscriptSink::new(self.session, events.clone()))?;
        self.state = DictationState::Listening;
        tracing::info!(session = self.session, "Dictation started");
        Ok(())
    }

    /// Stop capturing. The transcript is kept.
    pub fn stop(&mut self) {
        if !self.is_listening() {
            return;
        }
        self.recognizer.stop();
        self.state = DictationState::Stopped;
        tracing::info!(session = self.session, "Dictation stopped");
    }

    pub fn transcript(&self) -> String {
        match (self.committed.is_empty(), self.interim.is_empty()) {
            (_, true) => self.committed.clone(),
            (true, false) => self.interim.clone(),
            (false, false) => format!("{} {}", self.committed, self.interim),
        }
    }

    pub fn reset_transcript(&mut self) {
        self.committed.clear();
        self.interim.clear();
    }

    /// Apply an update from the recognizer.
    ///
    /// Returns true when the update was taken. Updates that arrive while
    /// stopped, or that belong to an earlier session, are dropped. `Ended`
    /// moves to `Stopped` and keeps the transcript.
    pub fn apply(&mut self, session: u64, update: SpeechUpdate) -> bool {
        if !self.is_listening() || session != self.session {
            tracing::debug!(
                session,
                current = self.session,
                state = %self.state,
                "Dropping stale transcript update"
            );
            return false;
        }

        match update {
            SpeechUpdate::Interim(text) => {
                self.interim = text.trim().to_string();
            }
            SpeechUpdate::Final(text) => {
                let phrase = text.trim();
                if !phrase.is_empty() {
                    if !self.committed.is_empty() {
                        self.committed.push(' ');
                    }
                    self.committed.push_str(phrase);
                }
                self.interim.clear();
            }
            SpeechUpdate::Ended => {
                self.recognizer.stop();
                self.state = DictationState::Stopped;
                tracing::info!(session, "Dictation ended by the recognizer");
            }
        }
        true
    }
}
