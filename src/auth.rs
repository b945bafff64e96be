use std::fmt;

use thiserror::Error;

/// Bearer token for the messaging API. Login and logout happen elsewhere;
/// the session is handed one of these (or nothing) when it is created.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty or blank token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() { None } else { Some(Self(token)) }
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("authentication required")]
pub struct AuthRequired;

/// Gate evaluated once per mount, before any fetch is issued.
pub fn check(credential: Option<&Credential>) -> Result<Credential, AuthRequired> {
    credential.cloned().ok_or(AuthRequired)
}
