//! Error taxonomy for poll cycles

/// The message payload did not have the shape the poller expects
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("message has no payload")]
    MissingPayload,

    #[error("no html part")]
    NoHtmlPart,

    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    #[error("html part has no body data")]
    MissingBodyData,

    #[error("html part body is not valid base64")]
    InvalidBodyEncoding,
}

/// The mail service rejected the supplied credentials (HTTP 401/403)
#[derive(Debug, thiserror::Error)]
#[error("Mail service rejected the credentials (HTTP {status})")]
pub struct UnauthorizedError {
    pub status: u16,
}

/// Failure of a single poll cycle, delivered to listeners as an `error` event
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Network or service failure during a list or get call
    #[error(transparent)]
    Transport(anyhow::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl PollError {
    /// Whether the underlying cause is a credentials rejection
    pub fn is_unauthorized(&self) -> bool {
        match self {
            PollError::Transport(e) => e.downcast_ref::<UnauthorizedError>().is_some(),
            PollError::Extraction(_) => false,
        }
    }

    /// The extraction failure, if this is one
    pub fn as_extraction(&self) -> Option<&ExtractionError> {
        match self {
            PollError::Extraction(e) => Some(e),
            PollError::Transport(_) => None,
        }
    }
}
