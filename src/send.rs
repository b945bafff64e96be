//! Draft handling and the optimistic send path.
//!
//! A send is split into `prepare` (validate, mark in flight), `submit` (the
//! network round-trip) and `complete` (append or keep the draft), so a host
//! can run the request on its own task while the session stays usable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::api::client::MessagingApi;
use crate::api::models::{ContactId, Message, SendMessageRequest};
use crate::auth::Credential;
use crate::error::ApiError;
use crate::events::{EventSink, SessionEvent};
use crate::store::ConversationStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    text: String,
}

impl Draft {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank draft or no active contact. Nothing was sent.
    Skipped,
    /// Another send has not completed yet. Nothing was sent.
    InFlight,
    /// No credential; the host was asked to authenticate.
    Unauthenticated,
    Sent(Message),
    /// The draft is kept for a retry.
    Failed { reason: String },
}

/// A validated message waiting for its round-trip. Holds the pipeline's
/// in-flight slot until it is completed or dropped.
#[derive(Debug)]
pub struct OutgoingMessage {
    pub contact_id: ContactId,
    pub request: SendMessageRequest,
    guard: InFlightGuard,
}

/// Clears the in-flight flag on drop, so an abandoned or aborted send never
/// blocks the next one.
#[derive(Debug)]
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
pub struct SendPipeline {
    in_flight: Arc<AtomicBool>,
}

impl SendPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn prepare(&mut self, contact_id: Option<ContactId>, draft: &Draft) -> Result<OutgoingMessage, SendOutcome> {
        let Some(contact_id) = contact_id else {
            return Err(SendOutcome::Skipped);
        };
        if draft.is_blank() {
            return Err(SendOutcome::Skipped);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SendOutcome::InFlight);
        }
        Ok(OutgoingMessage {
            contact_id,
            request: SendMessageRequest {
                receiver_id: contact_id,
                message: draft.text().to_owned(),
                client_message_id: Uuid::new_v4().to_string(),
            },
            guard: InFlightGuard(Arc::clone(&self.in_flight)),
        })
    }

    pub async fn submit<A: MessagingApi + ?Sized>(
        api: &A,
        credential: &Credential,
        outgoing: &OutgoingMessage,
    ) -> Result<(), ApiError> {
        api.send_message(credential, &outgoing.request).await
    }

    /// Applies the result of a round-trip. The store is updated before this
    /// returns, so the next render already shows the new message.
    pub fn complete(
        &mut self,
        outgoing: OutgoingMessage,
        result: Result<(), ApiError>,
        draft: &mut Draft,
        store: &mut ConversationStore,
        events: &EventSink,
    ) -> SendOutcome {
        let OutgoingMessage { contact_id, request, guard } = outgoing;
        drop(guard);
        match result {
            Ok(()) => {
                let SendMessageRequest { message, client_message_id, .. } = request;
                let message = Message::outgoing(message, Utc::now(), client_message_id);
                store.append(contact_id, message.clone());
                draft.clear();
                info!("message sent to contact {}", contact_id);
                events.emit(SessionEvent::MessageSent { contact_id, message: message.clone() });
                SendOutcome::Sent(message)
            }
            Err(e) => {
                warn!("failed to send message to contact {}: {}", contact_id, e);
                let reason = e.to_string();
                events.emit(SessionEvent::SendFailed { contact_id, reason: reason.clone() });
                SendOutcome::Failed { reason }
            }
        }
    }
}
