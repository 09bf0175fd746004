//! Payload extraction
//!
//! Flattens a Gmail payload tree into a [`Message`]. Only the payload's
//! immediate parts are searched for the `text/html` body; nested multipart
//! trees are not descended into.

use base64::prelude::*;

use super::api::{GmailMessage, Header, MessagePart, MessagePayload};
use crate::error::ExtractionError;
use crate::models::Message;

const HTML_MIME_TYPE: &str = "text/html";

/// Extract sender, subject and html body from a fetched message
pub fn extract_message(gmail_msg: &GmailMessage) -> Result<Message, ExtractionError> {
    let payload = gmail_msg
        .payload
        .as_ref()
        .ok_or(ExtractionError::MissingPayload)?;

    extract_payload(payload)
}

fn extract_payload(payload: &MessagePayload) -> Result<Message, ExtractionError> {
    let part = find_html_part(payload).ok_or(ExtractionError::NoHtmlPart)?;
    let sender = required_header(payload, "From")?;
    let subject = required_header(payload, "Subject")?;

    let data = part
        .body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .ok_or(ExtractionError::MissingBodyData)?;
    let body = decode_base64_body(data).ok_or(ExtractionError::InvalidBodyEncoding)?;

    Ok(Message {
        sender: sender.to_string(),
        subject: subject.to_string(),
        body,
    })
}

/// First immediate part whose MIME type is exactly `text/html`
fn find_html_part(payload: &MessagePayload) -> Option<&MessagePart> {
    payload
        .parts
        .as_deref()?
        .iter()
        .find(|part| part.mime_type.as_deref() == Some(HTML_MIME_TYPE))
}

/// Header value by exact (case-sensitive) name
fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

fn required_header<'a>(
    payload: &'a MessagePayload,
    name: &'static str,
) -> Result<&'a str, ExtractionError> {
    payload
        .headers
        .as_deref()
        .and_then(|headers| find_header(headers, name))
        .ok_or(ExtractionError::MissingHeader(name))
}

/// Decode base64-encoded body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple decoders.
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_base64_body(data: &str) -> Option<String> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&BASE64_URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    decoders
        .iter()
        .find_map(|decoder| decoder.decode(data).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
