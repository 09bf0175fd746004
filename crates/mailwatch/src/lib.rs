//! mailwatch - new-mail detection for a single Gmail mailbox
//!
//! This crate provides:
//! - Gmail API client for listing and fetching messages
//! - Payload extraction into a flat sender/subject/body [`Message`]
//! - A background poller that emits `message` and `error` events
//! - Credentials and options loading from the mailwatch config directory
//!
//! The first completed poll only establishes a baseline; later polls emit
//! the newest message whenever its id changes. The loop stops at the first
//! failed cycle.

pub mod config;
pub mod error;
pub mod gmail;
pub mod memory;
pub mod models;
pub mod poller;
pub mod service;

pub use crate::config::{Credentials, DEFAULT_POLL_INTERVAL_MS, WatchOptions};
pub use error::{ExtractionError, PollError, UnauthorizedError};
pub use gmail::{GmailClient, decode_base64_body, extract_message};
pub use memory::{Listing, ScriptedMailbox, html_message};
pub use models::{Message, MessageId};
pub use poller::{
    MailPoller, PollListener, PollPhase, PollerHandle, PollerState, fetch_message,
    list_newest_message_id, poll_once,
};
pub use service::MailboxService;
