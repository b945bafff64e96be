//! Client core for the storefront messaging page: contact directory,
//! per-contact conversation sync and optimistic sending.

pub mod api;
pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod selection;
pub mod send;
pub mod session;
pub mod store;
pub mod sync;
pub mod utils;

pub use api::{ApiClient, Contact, ContactId, Message, MessagingApi};
pub use auth::Credential;
pub use error::{ApiError, ConfigError};
pub use events::SessionEvent;
pub use selection::ConversationView;
pub use send::SendOutcome;
pub use session::{MessagingSession, MountOutcome, PendingDirectory};
pub use store::ConversationStore;
pub use sync::SyncStatus;
