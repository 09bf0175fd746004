//! mailwatch - log new Gmail messages as they arrive
//!
//! Loads credentials and options from ~/.config/mailwatch/ (or MAILWATCH_*
//! environment variables), then polls until the first failure.

use anyhow::{Context, Result};
use log::{error, info, warn};
use mailwatch::{Credentials, MailPoller, Message, PollError, PollListener, WatchOptions};
use std::sync::Arc;

/// Writes poller events to the log
struct LogListener;

impl PollListener for LogListener {
    fn on_message(&self, message: &Message) {
        info!(
            "New mail from {} - {} ({} bytes of html)",
            message.sender,
            message.subject,
            message.body.len()
        );
    }

    fn on_error(&self, error: &PollError) {
        if error.is_unauthorized() {
            error!("Mail service rejected the access token; supply fresh credentials");
        }
        error!("Polling failed: {:#}", error);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let credentials = Credentials::load().inspect_err(|_| {
        if let Some(path) = Credentials::default_credentials_path() {
            warn!(
                "To configure mailwatch, either:\n\
                 1. Place your credentials at: {}\n\
                 2. Or set MAILWATCH_CLIENT_ID, MAILWATCH_CLIENT_SECRET and MAILWATCH_ACCESS_TOKEN",
                path.display()
            );
        }
    })?;
    let options = WatchOptions::load().context("Invalid watch options")?;

    let handle = MailPoller::from_credentials(credentials)
        .poll_interval(options.poll_interval())
        .listener(Arc::new(LogListener))
        .start()?;

    info!("Watching for new mail");
    let stopped_by = handle.join()?;
    Err(anyhow::Error::new(stopped_by).context("Polling stopped"))
}
