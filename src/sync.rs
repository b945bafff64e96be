//! Fan-out of per-contact history fetches.
//!
//! One task per contact, collected in completion order. A failed fetch only
//! affects its own contact.

use std::sync::Arc;

use log::{debug, warn};
use tokio::task::JoinSet;

use crate::api::client::MessagingApi;
use crate::api::models::{Contact, ContactId, Message};
use crate::auth::Credential;
use crate::error::ApiError;

#[derive(Debug)]
pub struct SyncUpdate {
    pub contact_id: ContactId,
    pub result: Result<Vec<Message>, ApiError>,
}

/// What applying one [`SyncUpdate`] did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    Loaded(ContactId),
    Failed(ContactId),
    /// Contact is no longer in the directory; the result was discarded.
    Discarded(ContactId),
}

#[derive(Default)]
pub struct ConversationSync {
    tasks: JoinSet<SyncUpdate>,
}

impl ConversationSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts one fetch per contact. Earlier fetches that are still running
    /// keep running; their results arrive through [`next_update`](Self::next_update) too.
    pub fn spawn_all<A: MessagingApi>(&mut self, api: &Arc<A>, credential: &Credential, contacts: &[Contact]) {
        for contact in contacts {
            let api = Arc::clone(api);
            let credential = credential.clone();
            let contact_id = contact.id;
            self.tasks.spawn(async move {
                let result = api.messages(&credential, contact_id).await;
                SyncUpdate { contact_id, result }
            });
        }
        debug!("fetching history for {} contact(s), {} in flight", contacts.len(), self.tasks.len());
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for the next fetch to finish. `None` once nothing is in flight.
    pub async fn next_update(&mut self) -> Option<SyncUpdate> {
        loop {
            match self.tasks.join_next().await? {
                Ok(update) => return Some(update),
                Err(e) if e.is_cancelled() => continue,
                Err(e) => warn!("history fetch task ended abnormally: {}", e),
            }
        }
    }

    /// Aborts every outstanding fetch.
    pub fn cancel(&mut self) {
        self.tasks.abort_all();
    }
}
