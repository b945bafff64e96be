//! Per-contact conversation histories.
//!
//! A missing key means the contact's history has not arrived yet; an empty
//! sequence means the server confirmed there are no messages. Keys are never
//! removed during a session.

use std::collections::{HashMap, HashSet};

use crate::api::models::{ContactId, Message};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationStore {
    conversations: HashMap<ContactId, Vec<Message>>,
    /// Correlation ids of optimistic messages not yet replaced by a fetch.
    local: HashMap<ContactId, HashSet<String>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the history for `contact_id` with a freshly fetched one.
    /// Other keys are untouched, so merges for different contacts commute.
    pub fn merge(mut self, contact_id: ContactId, messages: Vec<Message>) -> Self {
        self.apply(contact_id, messages);
        self
    }

    /// In-place form of [`merge`](Self::merge).
    pub fn apply(&mut self, contact_id: ContactId, messages: Vec<Message>) {
        self.local.remove(&contact_id);
        self.conversations.insert(contact_id, messages);
    }

    /// Appends one message, creating the sequence if it is absent.
    pub fn append(&mut self, contact_id: ContactId, message: Message) {
        if let Some(id) = &message.client_message_id {
            self.local.entry(contact_id).or_default().insert(id.clone());
        }
        self.conversations.entry(contact_id).or_default().push(message);
    }

    pub fn get(&self, contact_id: ContactId) -> Option<&[Message]> {
        self.conversations.get(&contact_id).map(Vec::as_slice)
    }

    pub fn contains(&self, contact_id: ContactId) -> bool {
        self.conversations.contains_key(&contact_id)
    }

    pub fn contact_ids(&self) -> impl Iterator<Item = ContactId> + '_ {
        self.conversations.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// The message was appended locally and no fetch has replaced it since.
    pub fn is_pending(&self, contact_id: ContactId, client_message_id: &str) -> bool {
        self.local
            .get(&contact_id)
            .is_some_and(|ids| ids.contains(client_message_id))
    }

    /// A fetched history for `contact_id` echoed the correlation id.
    pub fn is_confirmed(&self, contact_id: ContactId, client_message_id: &str) -> bool {
        !self.is_pending(contact_id, client_message_id)
            && self
                .get(contact_id)
                .unwrap_or_default()
                .iter()
                .any(|m| m.client_message_id.as_deref() == Some(client_message_id))
    }
}
