use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type ContactId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Contact {
    #[serde(rename = "UID")]
    pub id: ContactId,
    #[serde(rename = "Username")]
    pub display_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    #[serde(rename = "IsSender")]
    pub is_from_current_user: bool,
    #[serde(rename = "Message")]
    pub body: String,
    #[serde(rename = "CreatedAt", deserialize_with = "deserialize_created_at")]
    pub created_at: DateTime<Utc>,
    /// Correlation id of a message this client sent, when known.
    #[serde(rename = "ClientMessageID", default, skip_serializing_if = "Option::is_none")]
    pub client_message_id: Option<String>,
}

impl Message {
    /// Local record appended right after the server accepted a send.
    pub fn outgoing(body: impl Into<String>, created_at: DateTime<Utc>, client_message_id: String) -> Self {
        Self {
            is_from_current_user: true,
            body: body.into(),
            created_at,
            client_message_id: Some(client_message_id),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct SendMessageRequest {
    #[serde(rename = "ReceiverID")]
    pub receiver_id: ContactId,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "ClientMessageID")]
    pub client_message_id: String,
}

/// Accepts RFC 3339 timestamps as well as offset-less ones, which are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid CreatedAt: {raw}")))
}
