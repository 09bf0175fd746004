//! Last-seen-message state carried between poll cycles

use crate::models::MessageId;

/// Whether the baseline has been established yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// No cycle has completed; the next observation is the baseline
    Uninitialized,
    /// At least one cycle has completed
    Steady,
}

/// State owned by the poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerState {
    phase: PollPhase,
    last_message_id: Option<MessageId>,
}

impl Default for PollerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PollerState {
    pub fn new() -> Self {
        Self {
            phase: PollPhase::Uninitialized,
            last_message_id: None,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn is_first_poll(&self) -> bool {
        self.phase == PollPhase::Uninitialized
    }

    pub fn last_message_id(&self) -> Option<&MessageId> {
        self.last_message_id.as_ref()
    }

    /// The newest id if it counts as unseen mail.
    ///
    /// Never returns anything before the baseline is established.
    pub fn unseen<'a>(&self, newest: Option<&'a MessageId>) -> Option<&'a MessageId> {
        match self.phase {
            PollPhase::Uninitialized => None,
            PollPhase::Steady => newest.filter(|id| self.last_message_id.as_ref() != Some(*id)),
        }
    }

    /// Record a completed cycle's observation. The phase only moves forward.
    pub fn record(&mut self, newest: Option<MessageId>) {
        self.last_message_id = newest;
        self.phase = PollPhase::Steady;
    }
}
