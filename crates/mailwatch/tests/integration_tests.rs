//! Integration tests for the mailwatch crate
//!
//! These drive the background poller end to end against a scripted mailbox.
//! Every script ends by running out of listings, which stops the loop, so
//! `join` always returns.

use base64::prelude::*;
use mailwatch::gmail::api::{GmailMessage, Header, MessageBody, MessagePart, MessagePayload};
use mailwatch::{
    ExtractionError, Listing, MailPoller, Message, MessageId, PollError, PollListener,
    PollPhase, PollerState, ScriptedMailbox, decode_base64_body, html_message, poll_once,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every event it receives
#[derive(Default)]
struct Recorder {
    messages: Mutex<Vec<Message>>,
    errors: Mutex<Vec<String>>,
}

impl Recorder {
    fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl PollListener for Recorder {
    fn on_message(&self, message: &Message) {
        self.messages.lock().unwrap().push(message.clone());
    }

    fn on_error(&self, error: &PollError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

/// Run the poller over the mailbox script until it stops
fn run_to_completion(mailbox: &Arc<ScriptedMailbox>) -> (Arc<Recorder>, PollError) {
    let recorder = Arc::new(Recorder::default());
    let handle = MailPoller::new(Arc::clone(mailbox))
        .poll_interval(Duration::from_millis(1))
        .listener(recorder.clone())
        .start()
        .unwrap();

    let err = handle.join().unwrap();
    (recorder, err)
}

fn exhausted(err: &PollError) -> bool {
    matches!(err, PollError::Transport(e) if e.to_string() == "Listing script exhausted")
}

#[test]
fn test_first_poll_emits_nothing() {
    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox
        .push_listing(Listing::newest("a"))
        .insert_message(html_message("a", "old@example.com", "Old", "<p>old</p>"));

    let (recorder, err) = run_to_completion(&mailbox);

    assert!(recorder.messages().is_empty());
    assert_eq!(mailbox.get_calls(), 0);
    assert!(exhausted(&err));
}

#[test]
fn test_new_message_detected_on_second_poll() {
    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::newest("b"))
        .insert_message(html_message("a", "old@example.com", "Old", "<p>old</p>"))
        .insert_message(html_message(
            "b",
            "Ann Example <ann@example.com>",
            "Quarterly report",
            "<h1>Q3</h1><p>Numbers attached.</p>",
        ));

    let (recorder, _) = run_to_completion(&mailbox);

    assert_eq!(
        recorder.messages(),
        vec![Message::new(
            "Ann Example <ann@example.com>",
            "Quarterly report",
            "<h1>Q3</h1><p>Numbers attached.</p>",
        )]
    );
    assert_eq!(mailbox.get_calls(), 1);
}

#[test]
fn test_unchanged_newest_id_emits_nothing() {
    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::newest("a"));

    let (recorder, _) = run_to_completion(&mailbox);

    assert!(recorder.messages().is_empty());
    assert_eq!(mailbox.list_calls(), 4);
    assert_eq!(mailbox.get_calls(), 0);
}

#[test]
fn test_empty_first_poll_still_sets_baseline() {
    let mailbox = ScriptedMailbox::new();
    mailbox
        .push_listing(Listing::empty())
        .push_listing(Listing::newest("a"))
        .insert_message(html_message("a", "new@example.com", "First mail", "<p>hi</p>"));

    let mut state = PollerState::new();
    assert_eq!(poll_once(&mailbox, &mut state).unwrap(), None);
    assert_eq!(state.phase(), PollPhase::Steady);
    assert_eq!(state.last_message_id(), None);

    // Mail arriving in a previously empty mailbox counts as new
    let message = poll_once(&mailbox, &mut state).unwrap().unwrap();
    assert_eq!(message.subject, "First mail");
    assert_eq!(state.last_message_id(), Some(&MessageId::new("a")));
}

#[test]
fn test_only_newest_of_several_arrivals_is_emitted() {
    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::Ids(vec![
            MessageId::new("d"),
            MessageId::new("c"),
            MessageId::new("b"),
            MessageId::new("a"),
        ]))
        .insert_message(html_message("d", "d@example.com", "Fourth", "<p>d</p>"));

    let (recorder, _) = run_to_completion(&mailbox);

    let subjects: Vec<String> = recorder.messages().into_iter().map(|m| m.subject).collect();
    assert_eq!(subjects, vec!["Fourth".to_string()]);
}

#[test]
fn test_missing_html_part_stops_polling() {
    let mut plain_only = html_message("b", "x@example.com", "Plain", "hello");
    if let Some(parts) = plain_only.payload.as_mut().and_then(|p| p.parts.as_mut()) {
        parts.retain(|part| part.mime_type.as_deref() != Some("text/html"));
    }

    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::newest("b"))
        .push_listing(Listing::newest("c"))
        .push_listing(Listing::newest("d"))
        .insert_message(plain_only);

    let (recorder, err) = run_to_completion(&mailbox);

    assert_eq!(err.as_extraction(), Some(&ExtractionError::NoHtmlPart));
    assert_eq!(recorder.errors(), vec!["no html part".to_string()]);
    assert!(recorder.messages().is_empty());

    // No cycle after the failing one
    assert_eq!(mailbox.list_calls(), 2);
    assert_eq!(mailbox.remaining_listings(), 2);
}

#[test]
fn test_missing_subject_header() {
    let message = GmailMessage {
        id: "b".to_string(),
        payload: Some(MessagePayload {
            mime_type: Some("multipart/alternative".to_string()),
            headers: Some(vec![Header {
                name: "From".to_string(),
                value: "x@example.com".to_string(),
            }]),
            body: None,
            parts: Some(vec![MessagePart {
                mime_type: Some("text/html".to_string()),
                body: Some(MessageBody {
                    size: Some(4),
                    data: Some(BASE64_URL_SAFE_NO_PAD.encode("<p/>")),
                }),
                ..Default::default()
            }]),
        }),
        ..Default::default()
    };

    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::newest("b"))
        .insert_message(message);

    let (recorder, err) = run_to_completion(&mailbox);

    assert_eq!(
        err.as_extraction(),
        Some(&ExtractionError::MissingHeader("Subject"))
    );
    assert_eq!(recorder.errors(), vec!["missing header: Subject".to_string()]);
}

#[test]
fn test_body_base64_round_trip() {
    let original = "Привет, мир! — 日本語 — emoji 📬 & <html>";

    for encoded in [
        BASE64_URL_SAFE_NO_PAD.encode(original),
        BASE64_URL_SAFE.encode(original),
    ] {
        assert_eq!(decode_base64_body(&encoded).as_deref(), Some(original));
    }

    let mailbox = ScriptedMailbox::new();
    mailbox
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::newest("b"))
        .insert_message(html_message("b", "x@example.com", "Unicode", original));

    let mut state = PollerState::new();
    poll_once(&mailbox, &mut state).unwrap();
    let message = poll_once(&mailbox, &mut state).unwrap().unwrap();
    assert_eq!(message.body, original);
}

#[test]
fn test_list_failure_emits_one_error_and_stops() {
    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::Fail("Connection reset by peer".to_string()))
        .push_listing(Listing::newest("b"));

    let (recorder, err) = run_to_completion(&mailbox);

    assert!(matches!(err, PollError::Transport(_)));
    assert_eq!(
        recorder.errors(),
        vec!["Connection reset by peer".to_string()]
    );
    assert_eq!(mailbox.list_calls(), 2);
    assert_eq!(mailbox.remaining_listings(), 1);
}

#[test]
fn test_first_poll_failure_is_reported() {
    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox.push_listing(Listing::Fail("Invalid Credentials".to_string()));

    let (recorder, _) = run_to_completion(&mailbox);

    assert_eq!(recorder.errors().len(), 1);
    assert_eq!(mailbox.list_calls(), 1);
}

#[test]
fn test_listener_subscribed_while_running() {
    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox.push_listing(Listing::newest("a"));

    // Timing-dependent: the subscription has to land during the sleep after
    // the first cycle. The interval is long enough that it always does.
    let handle = MailPoller::new(Arc::clone(&mailbox))
        .poll_interval(Duration::from_millis(500))
        .start()
        .unwrap();

    let late = Arc::new(Recorder::default());
    handle.subscribe(late.clone());
    assert_eq!(handle.listener_count(), 1);

    handle.join().unwrap();
    assert_eq!(late.errors(), vec!["Listing script exhausted".to_string()]);
}

#[test]
fn test_error_and_message_never_share_a_cycle() {
    let mailbox = Arc::new(ScriptedMailbox::new());
    mailbox
        .push_listing(Listing::newest("a"))
        .push_listing(Listing::newest("b"))
        .push_listing(Listing::newest("c"))
        .insert_message(html_message("b", "b@example.com", "B", "<p>b</p>"));
    // "c" is missing, so the third cycle fails at fetch

    let (recorder, err) = run_to_completion(&mailbox);

    assert_eq!(recorder.messages().len(), 1);
    assert_eq!(recorder.errors().len(), 1);
    assert!(err.to_string().contains("Requested entity was not found: c"));
}
