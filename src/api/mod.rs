pub mod client;
pub mod models;

pub use client::{ApiClient, MessagingApi};
pub use models::{Contact, ContactId, Message, SendMessageRequest};
