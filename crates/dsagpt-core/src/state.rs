//! UI-agnostic chat state types
//!
//! These are shared by the orchestrator and any front end. None of them depend
//! on a specific UI framework.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A single entry of the conversation log.
///
/// Fields are private so a message cannot be edited after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    sender: Sender,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }
}

/// Identifies one submitted turn
pub type TurnId = u64;

/// Whether a turn is in flight.
///
/// The "bot is typing" indicator is derived from this value, so it cannot be
/// left on after the turn ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingReply {
        turn: TurnId,
        /// Snapshot of the user message that started the turn
        prompt: String,
    },
}

impl TurnState {
    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self, TurnState::AwaitingReply { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DictationState {
    #[default]
    Stopped,
    Listening,
}

impl fmt::Display for DictationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictationState::Stopped => write!(f, "Stopped"),
            DictationState::Listening => write!(f, "Listening"),
        }
    }
}

/// The signed-in user, as reported by the account service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default, alias = "name")]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            email: None,
        }
    }

    /// Best label for the header
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

// Account backends differ on whether ids are numeric or strings.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for user id, got {}",
            other
        ))),
    }
}

/// A completed turn, as handed to the persistence relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub user_message: String,
    pub bot_message: String,
    pub user_id: Option<String>,
}
