//! Append-only conversation log.

use tokio::sync::watch;

use crate::state::Message;

/// Ordered log of every message exchanged in this session.
///
/// There is no way to remove or edit an entry. Every append bumps a revision
/// that subscribers can watch to learn that new content arrived.
pub struct ConversationStore {
    messages: Vec<Message>,
    revision: watch::Sender<u64>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            messages: Vec::new(),
            revision,
        }
    }

    pub fn append(&mut self, message: Message) {
        tracing::debug!(sender = ?message.sender(), len = self.messages.len() + 1, "Message appended");
        self.messages.push(message);
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Receiver that is marked changed after every append
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
