//! In-process stand-in for the messaging API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use tokio::sync::Notify;

use storefront_chat::api::models::SendMessageRequest;
use storefront_chat::{ApiError, Contact, ContactId, Credential, Message, MessagingApi};

#[derive(Default)]
pub struct FakeApi {
    /// `None` makes the directory fetch fail.
    contacts: Mutex<Option<Vec<Contact>>>,
    histories: Mutex<HashMap<ContactId, Result<Vec<Message>, StatusCode>>>,
    gates: Mutex<HashMap<ContactId, Arc<Notify>>>,
    send_status: Mutex<Option<StatusCode>>,
    pub contact_calls: Mutex<usize>,
    pub message_calls: Mutex<Vec<ContactId>>,
    pub sent: Mutex<Vec<SendMessageRequest>>,
    pub tokens: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_contacts(&self, contacts: Option<Vec<Contact>>) {
        *self.contacts.lock().unwrap() = contacts;
    }

    pub fn set_history(&self, id: ContactId, messages: Vec<Message>) {
        self.histories.lock().unwrap().insert(id, Ok(messages));
    }

    pub fn fail_history(&self, id: ContactId, status: StatusCode) {
        self.histories.lock().unwrap().insert(id, Err(status));
    }

    /// Holds the history fetch for `id` until [`release`](Self::release).
    pub fn hold(&self, id: ContactId) {
        self.gates.lock().unwrap().insert(id, Arc::new(Notify::new()));
    }

    pub fn release(&self, id: ContactId) {
        if let Some(gate) = self.gates.lock().unwrap().get(&id) {
            gate.notify_one();
        }
    }

    pub fn fail_sends(&self, status: Option<StatusCode>) {
        *self.send_status.lock().unwrap() = status;
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn message_call_count(&self) -> usize {
        self.message_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MessagingApi for FakeApi {
    async fn contacts(&self, credential: &Credential) -> Result<Vec<Contact>, ApiError> {
        *self.contact_calls.lock().unwrap() += 1;
        self.tokens.lock().unwrap().push(credential.token().to_owned());
        self.contacts
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Status(StatusCode::UNAUTHORIZED))
    }

    async fn messages(&self, _credential: &Credential, contact_id: ContactId) -> Result<Vec<Message>, ApiError> {
        self.message_calls.lock().unwrap().push(contact_id);
        let gate = self.gates.lock().unwrap().get(&contact_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.histories.lock().unwrap().get(&contact_id).cloned() {
            Some(Ok(messages)) => Ok(messages),
            Some(Err(status)) => Err(ApiError::Status(status)),
            None => Ok(Vec::new()),
        }
    }

    async fn send_message(&self, _credential: &Credential, request: &SendMessageRequest) -> Result<(), ApiError> {
        if let Some(status) = *self.send_status.lock().unwrap() {
            return Err(ApiError::Status(status));
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub fn contact(id: ContactId, name: &str) -> Contact {
    Contact { id, display_name: name.to_owned() }
}

pub fn incoming(body: &str, minute: u32) -> Message {
    Message {
        is_from_current_user: false,
        body: body.to_owned(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap(),
        client_message_id: None,
    }
}

pub fn token() -> Option<Credential> {
    Credential::new("test-token")
}
