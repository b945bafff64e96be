use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::models::{Contact, ContactId, Message, SendMessageRequest};
use crate::auth::Credential;
use crate::error::ApiError;

const CONTACTS_PATH: &str = "api/Message/GetContacts";
const MESSAGES_PATH: &str = "api/Message/GetMessages/";
const SEND_PATH: &str = "api/Message/SendMessage";

/// The three calls the messaging page makes. Implemented over HTTP by
/// [`ApiClient`]; tests substitute an in-process fake.
#[async_trait]
pub trait MessagingApi: Send + Sync + 'static {
    async fn contacts(&self, credential: &Credential) -> Result<Vec<Contact>, ApiError>;

    async fn messages(&self, credential: &Credential, contact_id: ContactId) -> Result<Vec<Message>, ApiError>;

    async fn send_message(&self, credential: &Credential, request: &SendMessageRequest) -> Result<(), ApiError>;
}

pub struct ApiClient {
    pub http: HttpClient,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClient::new(),
            base: Self::base_api(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Root URL with a trailing slash so relative joins keep every path segment.
    /// A trailing `/api` is dropped because the endpoint paths already carry it.
    fn base_api(base_url: &str) -> Result<Url, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let trimmed = trimmed
            .strip_suffix("/api")
            .filter(|rest| !rest.ends_with('/'))
            .unwrap_or(trimmed);
        Ok(Url::parse(&format!("{}/", trimmed))?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn with_auth(req: reqwest::RequestBuilder, credential: &Credential) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("Bearer {}", credential.token()))
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MessagingApi for ApiClient {
    async fn contacts(&self, credential: &Credential) -> Result<Vec<Contact>, ApiError> {
        let endpoint = self.endpoint(CONTACTS_PATH)?;
        let resp = Self::with_auth(self.http.get(endpoint), credential).send().await?;
        Self::read_json(resp).await
    }

    async fn messages(&self, credential: &Credential, contact_id: ContactId) -> Result<Vec<Message>, ApiError> {
        let endpoint = self.endpoint(MESSAGES_PATH)?;
        let req = self.http.get(endpoint).query(&[("contactUID", contact_id)]);
        let resp = Self::with_auth(req, credential).send().await?;
        Self::read_json(resp).await
    }

    async fn send_message(&self, credential: &Credential, request: &SendMessageRequest) -> Result<(), ApiError> {
        let endpoint = self.endpoint(SEND_PATH)?;
        let resp = Self::with_auth(self.http.post(endpoint).json(request), credential)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(())
    }
}
