//! In-memory mailbox service
//!
//! Serves scripted list results and stored messages without a network.
//! Used by tests and for dry runs of the poller.

use anyhow::{Result, anyhow};
use base64::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use crate::gmail::api::{
    GmailMessage, Header, ListMessagesResponse, MessageBody, MessagePart, MessagePayload,
    MessageRef,
};
use crate::models::MessageId;
use crate::service::MailboxService;

/// Outcome of one scripted list call
#[derive(Debug, Clone)]
pub enum Listing {
    /// Message ids, newest first
    Ids(Vec<MessageId>),
    /// The call fails with this message
    Fail(String),
}

impl Listing {
    /// A listing whose newest message is `id`
    pub fn newest(id: &str) -> Self {
        Listing::Ids(vec![MessageId::new(id)])
    }

    pub fn empty() -> Self {
        Listing::Ids(Vec::new())
    }
}

/// Mailbox whose successive list calls follow a script
///
/// Once the script runs out, list calls fail, which stops a running poller.
#[derive(Default)]
pub struct ScriptedMailbox {
    listings: Mutex<VecDeque<Listing>>,
    messages: RwLock<HashMap<String, GmailMessage>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl ScriptedMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a list outcome to the script
    pub fn push_listing(&self, listing: Listing) -> &Self {
        if let Ok(mut guard) = self.listings.lock() {
            guard.push_back(listing);
        }
        self
    }

    /// Store a message so `get_message` can return it
    pub fn insert_message(&self, message: GmailMessage) -> &Self {
        if let Ok(mut guard) = self.messages.write() {
            guard.insert(message.id.clone(), message);
        }
        self
    }

    /// Number of list calls made so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of get calls made so far
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Scripted listings not yet consumed
    pub fn remaining_listings(&self) -> usize {
        self.listings.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl MailboxService for ScriptedMailbox {
    fn list_messages(&self, max_results: usize) -> Result<ListMessagesResponse> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let next = self
            .listings
            .lock()
            .map_err(|_| anyhow!("Listing script lock poisoned"))?
            .pop_front();

        match next {
            Some(Listing::Ids(ids)) => {
                let refs: Vec<MessageRef> = ids
                    .into_iter()
                    .take(max_results)
                    .map(|id| MessageRef {
                        id: id.0,
                        thread_id: None,
                    })
                    .collect();
                Ok(ListMessagesResponse {
                    result_size_estimate: Some(refs.len() as u32),
                    // Gmail omits the field entirely for an empty mailbox
                    messages: if refs.is_empty() { None } else { Some(refs) },
                    next_page_token: None,
                })
            }
            Some(Listing::Fail(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("Listing script exhausted")),
        }
    }

    fn get_message(&self, id: &MessageId) -> Result<GmailMessage> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        self.messages
            .read()
            .map_err(|_| anyhow!("Message store lock poisoned"))?
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("Requested entity was not found: {id}"))
    }
}

/// Build a Gmail-shaped multipart message with a plain and an html part
pub fn html_message(id: &str, from: &str, subject: &str, html: &str) -> GmailMessage {
    let header = |name: &str, value: &str| Header {
        name: name.to_string(),
        value: value.to_string(),
    };
    let part = |mime_type: &str, text: &str| MessagePart {
        mime_type: Some(mime_type.to_string()),
        body: Some(MessageBody {
            size: Some(text.len() as u32),
            data: Some(BASE64_URL_SAFE.encode(text)),
        }),
        ..Default::default()
    };

    GmailMessage {
        id: id.to_string(),
        thread_id: Some(id.to_string()),
        snippet: None,
        payload: Some(MessagePayload {
            mime_type: Some("multipart/alternative".to_string()),
            headers: Some(vec![header("From", from), header("Subject", subject)]),
            body: None,
            parts: Some(vec![part("text/plain", html), part("text/html", html)]),
        }),
    }
}
