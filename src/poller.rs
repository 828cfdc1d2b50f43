//! # Telemetry Poller
//!
//! Fixed-cadence loop that fetches snapshots, classifies them and emits
//! lifecycle events to the coordinator.
//!
//! ## Per-poll event order
//!
//! 1. `IsConnected(bool)` always
//! 2. `New` if the session state changed (checked even when not ready)
//! 3. `Idle(true)`, or `Idle(false)` followed by `Data(record)`
//!
//! The delay is measured from the end of one fetch to the start of the
//! next. There is no backoff: an unreachable endpoint is retried at the same
//! interval forever.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::crest::TelemetrySource;
use crate::error::{CrestLoggerError, Result};
use crate::message::{Command, Event};
use crate::telemetry::extractor::extract;
use crate::telemetry::SessionClassifier;

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Polls a [`TelemetrySource`] and drives the session classifier
pub struct TelemetryPoller<S> {
    source: S,
    classifier: SessionClassifier,
    poll_interval: Duration,
    polls: u64,
}

impl<S: TelemetrySource> TelemetryPoller<S> {
    pub fn new(source: S, poll_interval: Duration) -> Self {
        Self {
            source,
            classifier: SessionClassifier::new(),
            poll_interval,
            polls: 0,
        }
    }

    /// Number of completed fetch attempts
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Fetch once and emit the events for that snapshot
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the coordinator has gone away. Fetch
    /// failures are not errors; they are reported as `IsConnected(false)`.
    pub async fn poll_once(&mut self, events: &mpsc::Sender<Event>) -> Result<()> {
        let snapshot = self.source.fetch().await;
        self.polls += 1;

        let connected = SessionClassifier::is_connected(snapshot.as_ref());
        send(events, Event::IsConnected(connected)).await?;

        let Some(snapshot) = snapshot else {
            return Ok(());
        };

        if self.classifier.is_new_session(&snapshot) {
            send(events, Event::New).await?;
        }

        if !SessionClassifier::is_ready(&snapshot) {
            return send(events, Event::Idle(true)).await;
        }

        send(events, Event::Idle(false)).await?;
        send(events, Event::Data(extract(&snapshot))).await
    }

    /// Poll until the coordinator goes away
    ///
    /// Only ever returns `Err(ChannelClosed)`.
    pub async fn poll_forever(&mut self, events: &mpsc::Sender<Event>) -> Result<()> {
        loop {
            self.poll_once(events).await?;
            sleep(self.poll_interval).await;
        }
    }

    /// Serve commands from the coordinator
    ///
    /// `Load` is answered with `LoadComplete`; `Fetch` enters the poll loop,
    /// which only ends once the event channel closes.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::Sender<Event>,
    ) -> Result<()> {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Load => {
                    info!("Telemetry source: {}", self.source.describe());
                    send(&events, Event::LoadComplete).await?;
                }
                Command::Fetch => {
                    info!("Polling every {}ms", self.poll_interval.as_millis());
                    if let Err(e) = self.poll_forever(&events).await {
                        debug!("Poll loop stopped after {} polls: {}", self.polls, e);
                    }
                    // Usually nobody is listening anymore
                    let _ = events.send(Event::FetchComplete).await;
                    return Ok(());
                }
            }
        }

        debug!("Command channel closed");
        Ok(())
    }
}

async fn send(events: &mpsc::Sender<Event>, event: Event) -> Result<()> {
    events
        .send(event)
        .await
        .map_err(|e| CrestLoggerError::ChannelClosed(format!("coordinator dropped {}", e.0.name())))
}
