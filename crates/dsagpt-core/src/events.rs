//! Events that flow back into the orchestrator from spawned work.
//!
//! Inference tasks, the dictation capability, and the identity lookup all run
//! off the main loop. They report back by sending a [`ChatEvent`], which the
//! host feeds into [`TurnOrchestrator::handle_event`](crate::TurnOrchestrator::handle_event).

use tokio::sync::mpsc;

use crate::error::ServiceError;
use crate::speech::SpeechUpdate;
use crate::state::{Identity, TurnId};

pub type EventSender = mpsc::UnboundedSender<ChatEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ChatEvent>;

#[derive(Debug)]
pub enum ChatEvent {
    /// The inference call for a turn finished
    Reply(TurnReply),
    /// The dictation capability recognized more speech
    Transcript { session: u64, update: SpeechUpdate },
    /// The identity lookup finished; `None` when it failed
    Identity(Option<Identity>),
}

#[derive(Debug)]
pub struct TurnReply {
    pub turn: TurnId,
    pub outcome: Result<String, ServiceError>,
}

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
