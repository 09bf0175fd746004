//! Mailbox service abstraction

use anyhow::Result;
use std::sync::Arc;

use crate::gmail::api::{GmailMessage, ListMessagesResponse};
use crate::models::MessageId;

/// The two mailbox calls the poller depends on
///
/// Implemented by [`GmailClient`](crate::gmail::GmailClient) for the real
/// service. Implementations are expected to be already authenticated.
pub trait MailboxService: Send {
    /// List messages for the authenticated mailbox, newest first
    fn list_messages(&self, max_results: usize) -> Result<ListMessagesResponse>;

    /// Get a full message (headers and MIME part tree) by ID
    fn get_message(&self, id: &MessageId) -> Result<GmailMessage>;
}

impl<T: MailboxService + ?Sized> MailboxService for Box<T> {
    fn list_messages(&self, max_results: usize) -> Result<ListMessagesResponse> {
        (**self).list_messages(max_results)
    }

    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        (**self).get_message(id)
    }
}

impl<T: MailboxService + Sync + ?Sized> MailboxService for Arc<T> {
    fn list_messages(&self, max_results: usize) -> Result<ListMessagesResponse> {
        (**self).list_messages(max_results)
    }

    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        (**self).get_message(id)
    }
}
