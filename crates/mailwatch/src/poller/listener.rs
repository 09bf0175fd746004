//! Event listener registration for poll results

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::PollError;
use crate::models::Message;

/// Receives poller events
///
/// Callbacks run on the poll thread; a slow listener delays the next cycle.
pub trait PollListener: Send + Sync {
    /// A new message was detected and fetched
    fn on_message(&self, message: &Message);

    /// A poll cycle failed; no further cycles will run
    fn on_error(&self, error: &PollError);
}

/// Listeners currently registered with a poller
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn PollListener>>>,
}

impl ListenerRegistry {
    pub(crate) fn new(initial: Vec<Arc<dyn PollListener>>) -> Self {
        Self {
            listeners: RwLock::new(initial),
        }
    }

    pub(crate) fn add(&self, listener: Arc<dyn PollListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    // Snapshot under the lock so callbacks may subscribe without deadlocking
    fn snapshot(&self) -> Vec<Arc<dyn PollListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn emit_message(&self, message: &Message) {
        for listener in self.snapshot() {
            listener.on_message(message);
        }
    }

    pub(crate) fn emit_error(&self, error: &PollError) {
        for listener in self.snapshot() {
            listener.on_error(error);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
