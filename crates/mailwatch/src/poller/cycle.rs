//! A single poll cycle: list, maybe fetch, record

use log::{debug, info};

use crate::error::PollError;
use crate::gmail::extract_message;
use crate::models::{Message, MessageId};
use crate::poller::state::PollerState;
use crate::service::MailboxService;

/// Identifier at the head of the mailbox listing, if any
pub fn list_newest_message_id<S>(service: &S) -> Result<Option<MessageId>, PollError>
where
    S: MailboxService + ?Sized,
{
    let list = service.list_messages(1).map_err(PollError::Transport)?;

    Ok(list
        .messages
        .and_then(|refs| refs.into_iter().next())
        .map(|r| MessageId::new(r.id)))
}

/// Fetch a message and flatten its payload
pub fn fetch_message<S>(service: &S, id: &MessageId) -> Result<Message, PollError>
where
    S: MailboxService + ?Sized,
{
    let gmail_msg = service.get_message(id).map_err(PollError::Transport)?;
    Ok(extract_message(&gmail_msg)?)
}

/// Run one cycle against `state`.
///
/// Returns the new message when one was detected. On error the state is
/// left untouched.
pub fn poll_once<S>(service: &S, state: &mut PollerState) -> Result<Option<Message>, PollError>
where
    S: MailboxService + ?Sized,
{
    let newest = list_newest_message_id(service)?;
    debug!(
        "Newest message: {}",
        newest.as_ref().map_or("<empty mailbox>", |id| id.as_str())
    );

    let message = match state.unseen(newest.as_ref()) {
        Some(id) => {
            info!("New message {}", id);
            Some(fetch_message(service, id)?)
        }
        None => {
            if state.is_first_poll() {
                debug!("Baseline established");
            }
            None
        }
    };

    state.record(newest);
    Ok(message)
}
