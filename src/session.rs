//! The messaging page's state: auth gate, contact directory, conversation
//! store, selection and draft, driven by one owner.
//!
//! All store mutations happen through `&mut self`, one update at a time.
//! Network work that must not block the owner (history fan-out, an
//! in-flight send) runs on spawned tasks and is applied when it completes.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::api::client::MessagingApi;
use crate::api::models::{Contact, ContactId};
use crate::auth::{self, Credential};
use crate::directory::{self, ContactDirectory};
use crate::error::ApiError;
use crate::events::{EventSink, SessionEvent};
use crate::selection::{self, ConversationView, Selection};
use crate::send::{Draft, OutgoingMessage, SendOutcome, SendPipeline};
use crate::store::ConversationStore;
use crate::sync::{ConversationSync, SyncStatus, SyncUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOutcome {
    AuthenticationRequired,
    ContactsUnavailable,
    Ready { contacts: usize },
}

/// A send that has passed validation. Owns everything it needs, so it can be
/// moved onto another task; feed the result back with
/// [`MessagingSession::finish_send`].
pub struct PendingSend<A: MessagingApi> {
    api: Arc<A>,
    credential: Credential,
    outgoing: OutgoingMessage,
}

pub struct CompletedSend {
    outgoing: OutgoingMessage,
    result: Result<(), ApiError>,
}

impl<A: MessagingApi> PendingSend<A> {
    pub fn contact_id(&self) -> ContactId {
        self.outgoing.contact_id
    }

    pub async fn dispatch(self) -> CompletedSend {
        let result = SendPipeline::submit(self.api.as_ref(), &self.credential, &self.outgoing).await;
        CompletedSend { outgoing: self.outgoing, result }
    }
}

/// A directory fetch started by [`MessagingSession::begin_mount`] or
/// [`MessagingSession::begin_refresh`].
pub struct PendingDirectory<A: MessagingApi> {
    api: Arc<A>,
    credential: Credential,
}

pub struct FetchedDirectory {
    credential: Credential,
    directory: ContactDirectory,
}

impl<A: MessagingApi> PendingDirectory<A> {
    pub async fn fetch(self) -> FetchedDirectory {
        let directory = directory::load(self.api.as_ref(), &self.credential).await;
        FetchedDirectory { credential: self.credential, directory }
    }
}

pub struct MessagingSession<A: MessagingApi> {
    api: Arc<A>,
    credential: Option<Credential>,
    /// Credential that passed the gate at the last mount.
    authorized: Option<Credential>,
    directory: ContactDirectory,
    store: ConversationStore,
    selection: Selection,
    draft: Draft,
    sender: SendPipeline,
    sync: ConversationSync,
    events: EventSink,
}

impl<A: MessagingApi> MessagingSession<A> {
    pub fn new(api: Arc<A>, credential: Option<Credential>) -> Self {
        Self {
            api,
            credential,
            authorized: None,
            directory: ContactDirectory::NotLoaded,
            store: ConversationStore::new(),
            selection: Selection::default(),
            draft: Draft::default(),
            sender: SendPipeline::new(),
            sync: ConversationSync::new(),
            events: EventSink::default(),
        }
    }

    pub fn with_events(mut self, tx: UnboundedSender<SessionEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    /// Replaces the credential. Takes effect at the next [`mount`](Self::mount);
    /// the gate is not re-evaluated on its own.
    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    /// Runs the auth gate, loads the directory and starts one history fetch
    /// per contact. Returns once the directory is known; histories arrive
    /// through [`next_update`](Self::next_update).
    pub async fn mount(&mut self) -> MountOutcome {
        match self.begin_mount() {
            Ok(pending) => {
                let fetched = pending.fetch().await;
                self.finish_directory(fetched)
            }
            Err(outcome) => outcome,
        }
    }

    /// Refetches the directory and every contact's history from scratch.
    pub async fn refresh_contacts(&mut self) -> MountOutcome {
        match self.begin_refresh() {
            Ok(pending) => {
                let fetched = pending.fetch().await;
                self.finish_directory(fetched)
            }
            Err(outcome) => outcome,
        }
    }

    /// Auth gate plus [`begin_refresh`](Self::begin_refresh). Without a
    /// credential nothing is fetched and the directory is marked unavailable.
    pub fn begin_mount(&mut self) -> Result<PendingDirectory<A>, MountOutcome> {
        match auth::check(self.credential.as_ref()) {
            Ok(credential) => {
                self.authorized = Some(credential);
                self.begin_refresh()
            }
            Err(_) => {
                info!("no credential present; skipping message fetches");
                self.authorized = None;
                self.directory = ContactDirectory::Unavailable;
                self.events.emit(SessionEvent::AuthenticationRequired);
                Err(MountOutcome::AuthenticationRequired)
            }
        }
    }

    /// Marks the directory as loading and hands back the fetch, so the host
    /// can render the loading state while it runs.
    pub fn begin_refresh(&mut self) -> Result<PendingDirectory<A>, MountOutcome> {
        let Some(credential) = self.authorized.clone() else {
            self.events.emit(SessionEvent::AuthenticationRequired);
            return Err(MountOutcome::AuthenticationRequired);
        };
        self.directory = ContactDirectory::Loading;
        Ok(PendingDirectory { api: Arc::clone(&self.api), credential })
    }

    /// Stores a fetched directory and starts the history fan-out for it.
    pub fn finish_directory(&mut self, fetched: FetchedDirectory) -> MountOutcome {
        let FetchedDirectory { credential, directory } = fetched;
        self.directory = directory;

        match &self.directory {
            ContactDirectory::Ready(contacts) => {
                self.events.emit(SessionEvent::ContactsLoaded { count: contacts.len() });
                if !contacts.is_empty() {
                    self.sync.spawn_all(&self.api, &credential, contacts);
                }
                MountOutcome::Ready { contacts: contacts.len() }
            }
            _ => {
                self.events.emit(SessionEvent::ContactsUnavailable);
                MountOutcome::ContactsUnavailable
            }
        }
    }

    /// Waits for one outstanding history fetch and merges it into the store.
    /// `None` once no fetch is in flight.
    pub async fn next_update(&mut self) -> Option<SyncStatus> {
        let update = self.sync.next_update().await?;
        Some(self.apply_update(update))
    }

    /// Applies every outstanding history fetch.
    pub async fn sync_all(&mut self) -> Vec<SyncStatus> {
        let mut applied = Vec::new();
        while let Some(status) = self.next_update().await {
            applied.push(status);
        }
        applied
    }

    fn apply_update(&mut self, update: SyncUpdate) -> SyncStatus {
        let SyncUpdate { contact_id, result } = update;
        if !self.directory.contains(contact_id) {
            debug!("discarding history for contact {} (not in directory)", contact_id);
            return SyncStatus::Discarded(contact_id);
        }
        match result {
            Ok(messages) => {
                debug!("history for contact {}: {} message(s)", contact_id, messages.len());
                self.events.emit(SessionEvent::ConversationLoaded { contact_id, messages: messages.len() });
                self.store.apply(contact_id, messages);
                SyncStatus::Loaded(contact_id)
            }
            Err(e) => {
                warn!("error fetching messages for contact {}: {}", contact_id, e);
                self.events.emit(SessionEvent::ConversationFailed { contact_id, reason: e.to_string() });
                SyncStatus::Failed(contact_id)
            }
        }
    }

    pub fn pending_fetches(&self) -> usize {
        self.sync.pending()
    }

    /// Aborts outstanding history fetches. Nothing calls this implicitly
    /// except dropping the session.
    pub fn cancel_sync(&mut self) {
        self.sync.cancel();
    }

    pub fn select(&mut self, contact_id: Option<ContactId>) {
        self.selection.select(contact_id);
    }

    pub fn selected(&self) -> Option<ContactId> {
        self.selection.active()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft.set(text);
    }

    pub fn draft(&self) -> &str {
        self.draft.text()
    }

    /// Validates the draft against the active contact and marks a send in
    /// flight. `Err` carries the outcome of a send that never started.
    pub fn begin_send(&mut self) -> Result<PendingSend<A>, SendOutcome> {
        let outgoing = self.sender.prepare(self.selection.active(), &self.draft)?;
        let Some(credential) = self.authorized.clone() else {
            drop(outgoing);
            self.events.emit(SessionEvent::AuthenticationRequired);
            return Err(SendOutcome::Unauthenticated);
        };
        Ok(PendingSend { api: Arc::clone(&self.api), credential, outgoing })
    }

    pub fn finish_send(&mut self, completed: CompletedSend) -> SendOutcome {
        let CompletedSend { outgoing, result } = completed;
        self.sender.complete(outgoing, result, &mut self.draft, &mut self.store, &self.events)
    }

    /// Sends the draft to the active contact and applies the result.
    pub async fn send(&mut self) -> SendOutcome {
        match self.begin_send() {
            Ok(pending) => {
                let completed = pending.dispatch().await;
                self.finish_send(completed)
            }
            Err(outcome) => outcome,
        }
    }

    pub fn view(&self) -> ConversationView<'_> {
        selection::render(&self.directory, &self.store, self.selection)
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    pub fn contacts(&self) -> &[Contact] {
        self.directory.contacts()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_loading(&self) -> bool {
        self.directory.is_loading()
    }
}
