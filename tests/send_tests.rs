//! Optimistic send: validation, append on success, draft kept on failure.

mod common;

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::sync::mpsc;

use common::{FakeApi, contact, incoming, token};
use storefront_chat::{MessagingSession, SendOutcome, SessionEvent};

async fn mounted(api: &Arc<FakeApi>) -> MessagingSession<FakeApi> {
    api.set_contacts(Some(vec![contact(1, "Alice"), contact(2, "Bob")]));
    api.set_history(1, vec![incoming("hi", 0)]);
    api.fail_history(2, StatusCode::BAD_GATEWAY);
    let mut session = MessagingSession::new(api.clone(), token());
    session.mount().await;
    session.sync_all().await;
    session
}

#[tokio::test]
async fn successful_send_appends_one_message_and_clears_draft() {
    let api = FakeApi::new();
    let mut session = mounted(&api).await;
    session.select(Some(1));
    session.set_draft("hello");

    let message = match session.send().await {
        SendOutcome::Sent(message) => message,
        other => panic!("expected Sent, got {other:?}"),
    };
    let history = session.store().get(1).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.last(), Some(&message));
    assert!(message.is_from_current_user);
    assert_eq!(message.body, "hello");
    assert_eq!(session.draft(), "");

    let sent = api.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].receiver_id, 1);
    assert_eq!(sent[0].message, "hello");
    assert_eq!(message.client_message_id.as_deref(), Some(sent[0].client_message_id.as_str()));
}

#[tokio::test]
async fn failed_send_keeps_draft_and_history() {
    let api = FakeApi::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = mounted(&api).await.with_events(tx);
    api.fail_sends(Some(StatusCode::INTERNAL_SERVER_ERROR));
    session.select(Some(1));
    session.set_draft("hello");
    let before = session.store().clone();

    assert!(matches!(session.send().await, SendOutcome::Failed { .. }));
    assert_eq!(session.store(), &before);
    assert_eq!(session.draft(), "hello");
    assert!(matches!(rx.try_recv(), Ok(SessionEvent::SendFailed { contact_id: 1, .. })));

    api.fail_sends(None);
    assert!(matches!(session.send().await, SendOutcome::Sent(_)));
    assert_eq!(session.store().get(1).unwrap().len(), 2);
}

#[tokio::test]
async fn blank_draft_or_no_selection_sends_nothing() {
    let api = FakeApi::new();
    let mut session = mounted(&api).await;
    let before = session.store().clone();

    session.select(Some(1));
    session.set_draft("");
    assert_eq!(session.send().await, SendOutcome::Skipped);
    session.set_draft("   ");
    assert_eq!(session.send().await, SendOutcome::Skipped);

    session.select(None);
    session.set_draft("hi");
    assert_eq!(session.send().await, SendOutcome::Skipped);

    assert_eq!(api.sent_count(), 0);
    assert_eq!(session.store(), &before);
    assert_eq!(session.draft(), "hi");
}

#[tokio::test]
async fn send_creates_history_for_unloaded_contact() {
    let api = FakeApi::new();
    let mut session = mounted(&api).await;
    assert!(!session.store().contains(2));

    session.select(Some(2));
    session.set_draft("are you there?");
    assert!(matches!(session.send().await, SendOutcome::Sent(_)));

    let history = session.store().get(2).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].body, "are you there?");
}

#[tokio::test]
async fn second_send_while_first_in_flight_is_suppressed() {
    let api = FakeApi::new();
    let mut session = mounted(&api).await;
    session.select(Some(1));
    session.set_draft("hello");

    let pending = session.begin_send().ok().unwrap();
    assert_eq!(pending.contact_id(), 1);
    assert!(matches!(session.begin_send(), Err(SendOutcome::InFlight)));

    let completed = tokio::spawn(pending.dispatch()).await.unwrap();
    assert!(matches!(session.finish_send(completed), SendOutcome::Sent(_)));
    assert_eq!(api.sent_count(), 1);
    assert_eq!(session.store().get(1).unwrap().len(), 2);
}

#[tokio::test]
async fn abandoned_send_does_not_block_the_next_one() {
    let api = FakeApi::new();
    let mut session = mounted(&api).await;
    session.select(Some(1));
    session.set_draft("hello");

    let pending = session.begin_send().ok().unwrap();
    drop(pending);

    let pending = session.begin_send().ok().unwrap();
    let task = tokio::spawn(pending.dispatch());
    task.abort();
    let _ = task.await;

    assert!(matches!(session.send().await, SendOutcome::Sent(_)));
    assert_eq!(api.sent_count(), 1);
    assert_eq!(session.draft(), "");
}

#[tokio::test]
async fn unmounted_session_does_not_send() {
    let api = FakeApi::new();
    api.set_contacts(Some(vec![contact(1, "Alice")]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = MessagingSession::new(api.clone(), None).with_events(tx);
    session.mount().await;
    session.select(Some(1));
    session.set_draft("hello");

    assert_eq!(session.send().await, SendOutcome::Unauthenticated);
    assert_eq!(api.sent_count(), 0);
    assert_eq!(session.draft(), "hello");
    assert_eq!(rx.try_recv().unwrap(), SessionEvent::AuthenticationRequired);
    assert_eq!(rx.try_recv().unwrap(), SessionEvent::AuthenticationRequired);

    // The in-flight marker was released, so a later attempt is judged afresh.
    assert_eq!(session.send().await, SendOutcome::Unauthenticated);
}

#[tokio::test]
async fn refetch_replaces_optimistic_copy_with_server_history() {
    let api = FakeApi::new();
    let mut session = mounted(&api).await;
    session.select(Some(1));
    session.set_draft("hello");
    let SendOutcome::Sent(local) = session.send().await else {
        panic!("send failed");
    };
    let correlation = local.client_message_id.clone().unwrap();
    assert!(session.store().is_pending(1, &correlation));

    let mut echoed = incoming("hello", 1);
    echoed.is_from_current_user = true;
    echoed.client_message_id = Some(correlation.clone());
    api.set_history(1, vec![incoming("hi", 0), echoed]);
    session.refresh_contacts().await;
    session.sync_all().await;

    assert_eq!(session.store().get(1).unwrap().len(), 2);
    assert!(session.store().is_confirmed(1, &correlation));
}
