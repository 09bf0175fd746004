//! Gmail API HTTP client
//!
//! Provides the list and get calls used by the poller.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use log::warn;

use super::api::{GmailMessage, ListMessagesResponse};
use crate::config::Credentials;
use crate::error::UnauthorizedError;
use crate::models::MessageId;
use crate::service::MailboxService;

/// Gmail API client bound to one set of credentials
pub struct GmailClient {
    credentials: Credentials,
    base_url: String,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Create a new Gmail client
    ///
    /// The access token is used as given. Expired credentials are accepted
    /// with a warning; the service will reject them on first use.
    pub fn new(credentials: Credentials) -> Self {
        if credentials.is_expired() {
            warn!(
                "Access token for client {} has expired; requests will likely be rejected",
                credentials.client_id
            );
        }

        Self {
            credentials,
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (e.g. a local proxy)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn list_url(&self, max_results: usize) -> String {
        format!(
            "{}/users/me/messages?maxResults={}",
            self.base_url,
            max_results.clamp(1, 500)
        )
    }

    fn message_url(&self, id: &MessageId) -> String {
        format!(
            "{}/users/me/messages/{}?format=full",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }

    /// Issue an authenticated GET and parse the JSON body
    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let response = ureq::get(url)
            .header("Authorization", &self.credentials.authorization_header())
            .call();

        match response {
            Ok(mut resp) => resp
                .body_mut()
                .read_json()
                .with_context(|| format!("Failed to parse {what} response")),
            Err(ureq::Error::StatusCode(status @ (401 | 403))) => Err(anyhow::Error::new(
                UnauthorizedError { status },
            )
            .context(format!("Failed to send {what} request"))),
            Err(e) => Err(anyhow::Error::new(e).context(format!("Failed to send {what} request"))),
        }
    }
}

impl MailboxService for GmailClient {
    fn list_messages(&self, max_results: usize) -> Result<ListMessagesResponse> {
        self.get_json(&self.list_url(max_results), "list messages")
    }

    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        self.get_json(&self.message_url(id), "get message")
    }
}
