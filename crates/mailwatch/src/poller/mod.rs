//! Mailbox poller
//!
//! Runs poll cycles on a dedicated thread. Each cycle starts only after the
//! previous one (including its HTTP round trips) has finished, then the
//! thread sleeps for the poll interval. The first failed cycle ends the loop.

mod cycle;
mod listener;
mod state;

pub use cycle::{fetch_message, list_newest_message_id, poll_once};
pub use listener::PollListener;
pub use state::{PollPhase, PollerState};

use anyhow::{Context, Result, anyhow};
use log::info;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::{Credentials, DEFAULT_POLL_INTERVAL_MS};
use crate::error::PollError;
use crate::gmail::GmailClient;
use crate::service::MailboxService;
use listener::ListenerRegistry;

/// Builder for a polling loop over one mailbox
pub struct MailPoller<S> {
    service: S,
    poll_interval: Duration,
    listeners: Vec<Arc<dyn PollListener>>,
}

impl MailPoller<GmailClient> {
    /// Poll the Gmail mailbox the credentials belong to
    pub fn from_credentials(credentials: Credentials) -> Self {
        Self::new(GmailClient::new(credentials))
    }
}

impl<S: MailboxService + 'static> MailPoller<S> {
    /// Create a poller with the default 1000 ms interval
    pub fn new(service: S) -> Self {
        Self {
            service,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            listeners: Vec::new(),
        }
    }

    /// Set the delay between the end of one cycle and the start of the next.
    /// Zero is raised to one millisecond.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Register a listener before the loop starts
    pub fn listener(mut self, listener: Arc<dyn PollListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Spawn the poll thread and return immediately
    ///
    /// Only thread creation can fail here; poll failures are delivered to
    /// listeners.
    pub fn start(self) -> Result<PollerHandle> {
        let listeners = Arc::new(ListenerRegistry::new(self.listeners));
        let registry = Arc::clone(&listeners);
        let service = self.service;
        let interval = self.poll_interval;

        let thread = thread::Builder::new()
            .name("mailwatch-poller".to_string())
            .spawn(move || run_loop(service, interval, &registry))
            .context("Failed to spawn poller thread")?;

        Ok(PollerHandle { listeners, thread })
    }
}

/// Handle to a running poll loop
pub struct PollerHandle {
    listeners: Arc<ListenerRegistry>,
    thread: JoinHandle<PollError>,
}

impl PollerHandle {
    /// Register a listener on the running loop. It receives events emitted
    /// after registration.
    pub fn subscribe(&self, listener: Arc<dyn PollListener>) {
        self.listeners.add(listener);
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether the loop has stopped
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the loop stops, returning the error that stopped it
    pub fn join(self) -> Result<PollError> {
        self.thread
            .join()
            .map_err(|_| anyhow!("Poller thread panicked"))
    }
}

fn run_loop<S: MailboxService>(
    service: S,
    interval: Duration,
    listeners: &ListenerRegistry,
) -> PollError {
    let mut state = PollerState::new();
    info!("Polling mailbox every {} ms", interval.as_millis());

    loop {
        match poll_once(&service, &mut state) {
            Ok(Some(message)) => listeners.emit_message(&message),
            Ok(None) => {}
            Err(err) => {
                listeners.emit_error(&err);
                info!("Polling stopped: {}", err);
                return err;
            }
        }

        thread::sleep(interval);
    }
}
