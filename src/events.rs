use log::debug;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::models::{ContactId, Message};

/// Notifications for the hosting UI. Authentication prompts and failures
/// that the core swallows are reported here as well as in the log.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AuthenticationRequired,
    ContactsLoaded { count: usize },
    ContactsUnavailable,
    ConversationLoaded { contact_id: ContactId, messages: usize },
    ConversationFailed { contact_id: ContactId, reason: String },
    MessageSent { contact_id: ContactId, message: Message },
    SendFailed { contact_id: ContactId, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<SessionEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<SessionEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn emit(&self, event: SessionEvent) {
        let Some(tx) = &self.tx else { return };
        if tx.send(event).is_err() {
            debug!("session event dropped: receiver closed");
        }
    }
}
