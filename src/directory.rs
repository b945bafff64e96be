use log::{info, warn};

use crate::api::client::MessagingApi;
use crate::api::models::{Contact, ContactId};
use crate::auth::Credential;

/// Contact list for the current credential.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ContactDirectory {
    #[default]
    NotLoaded,
    Loading,
    /// Fetch failed or was unauthorized; rendered as "no contacts".
    Unavailable,
    Ready(Vec<Contact>),
}

impl ContactDirectory {
    /// True until a fetch has produced a result.
    pub fn is_loading(&self) -> bool {
        matches!(self, ContactDirectory::NotLoaded | ContactDirectory::Loading)
    }

    pub fn contacts(&self) -> &[Contact] {
        match self {
            ContactDirectory::Ready(contacts) => contacts,
            _ => &[],
        }
    }

    pub fn find(&self, id: ContactId) -> Option<&Contact> {
        self.contacts().iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ContactId) -> bool {
        self.find(id).is_some()
    }
}

/// Fetches the directory. Any failure is logged and collapsed into
/// [`ContactDirectory::Unavailable`].
pub async fn load<A: MessagingApi + ?Sized>(api: &A, credential: &Credential) -> ContactDirectory {
    match api.contacts(credential).await {
        Ok(contacts) => {
            info!("loaded {} contact(s)", contacts.len());
            ContactDirectory::Ready(contacts)
        }
        Err(e) => {
            warn!("failed to load contacts: {}", e);
            ContactDirectory::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: ContactId, name: &str) -> Contact {
        Contact { id, display_name: name.to_owned() }
    }

    #[test]
    fn only_ready_directory_exposes_contacts() {
        assert!(ContactDirectory::Unavailable.contacts().is_empty());
        assert!(ContactDirectory::Loading.is_loading());
        assert!(ContactDirectory::NotLoaded.is_loading());
        assert!(!ContactDirectory::Unavailable.is_loading());
        let dir = ContactDirectory::Ready(vec![contact(1, "Alice"), contact(2, "Bob")]);
        assert_eq!(dir.find(2).map(|c| c.display_name.as_str()), Some("Bob"));
        assert!(!dir.contains(3));
    }
}
