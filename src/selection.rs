use crate::api::models::{ContactId, Message};
use crate::directory::ContactDirectory;
use crate::store::ConversationStore;

pub const UNKNOWN_CONTACT: &str = "Unknown User";

/// The active contact, if any. Set only by the user; never cleared
/// automatically when the directory changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    active: Option<ContactId>,
}

impl Selection {
    pub fn select(&mut self, contact_id: Option<ContactId>) {
        self.active = contact_id;
    }

    pub fn active(&self) -> Option<ContactId> {
        self.active
    }
}

/// What the conversation pane should show.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationView<'a> {
    Loading,
    NoContacts,
    ChooseContact,
    NoMessagesYet {
        contact_id: ContactId,
        display_name: &'a str,
    },
    Conversation {
        contact_id: ContactId,
        display_name: &'a str,
        messages: &'a [Message],
    },
}

pub fn render<'a>(
    directory: &'a ContactDirectory,
    store: &'a ConversationStore,
    selection: Selection,
) -> ConversationView<'a> {
    if directory.is_loading() {
        return ConversationView::Loading;
    }
    match selection.active() {
        Some(contact_id) => {
            let display_name = directory
                .find(contact_id)
                .map(|c| c.display_name.as_str())
                .unwrap_or(UNKNOWN_CONTACT);
            match store.get(contact_id) {
                Some(messages) => ConversationView::Conversation { contact_id, display_name, messages },
                None => ConversationView::NoMessagesYet { contact_id, display_name },
            }
        }
        None if directory.contacts().is_empty() => ConversationView::NoContacts,
        None => ConversationView::ChooseContact,
    }
}
