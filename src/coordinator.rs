//! # Coordinator
//!
//! Consumes poller events and drives the session log.
//!
//! - `New` seals the open log and marks the next record as the start of a
//!   new file
//! - `Data` opens a file if needed, then appends the record
//! - `IsConnected` and `Idle` notify the observer once per edge, never
//!   repeatedly while the state is unchanged
//! - A disconnect does not seal the log; the open file keeps receiving
//!   records after a reconnect until `New` or shutdown
//!
//! Write failures are returned to the caller of [`Coordinator::handle`];
//! [`Coordinator::run`] logs them and keeps consuming events.

use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::{CrestLoggerError, Result};
use crate::message::{Command, Event};
use crate::telemetry::{NormalizedRecord, SessionLog};

/// Last known connectivity, for edge detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// Last known readiness, for edge detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Unknown,
    Idle,
    Ready,
}

/// User-facing lifecycle notifications
#[cfg_attr(test, mockall::automock)]
pub trait LifecycleObserver: Send {
    /// The poller finished loading
    fn load_complete(&mut self);
    /// Telemetry went away (or never arrived)
    fn connecting(&mut self);
    fn connected(&mut self);
    /// Connected, but the game is not in a loggable state
    fn waiting_for_data(&mut self);
    fn data_incoming(&mut self);
    fn logging_started(&mut self, path: &Path);
    fn logging_complete(&mut self, path: &Path);
    /// The poll loop returned
    fn fetch_complete(&mut self);
}

/// Observer that reports lifecycle changes through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LifecycleObserver for TracingObserver {
    fn load_complete(&mut self) {
        info!("Load complete");
    }

    fn connecting(&mut self) {
        info!("Connecting...");
    }

    fn connected(&mut self) {
        info!("Connected");
    }

    fn waiting_for_data(&mut self) {
        info!("Waiting for data");
    }

    fn data_incoming(&mut self) {
        info!("Data incoming!");
    }

    fn logging_started(&mut self, path: &Path) {
        info!("Logging to \"{}\"", path.display());
    }

    fn logging_complete(&mut self, path: &Path) {
        info!("Logging complete: \"{}\"", path.display());
    }

    fn fetch_complete(&mut self) {
        info!("Fetch complete");
    }
}

/// Lifecycle state machine between the poller and the session log
pub struct Coordinator<O = TracingObserver> {
    log: SessionLog,
    observer: O,
    commands: Option<mpsc::Sender<Command>>,
    connectivity: Connectivity,
    readiness: Readiness,
    /// The next record starts a new session file
    is_new: bool,
}

impl<O: LifecycleObserver> Coordinator<O> {
    /// Create a coordinator in the "new session" state
    pub fn new(log: SessionLog, observer: O) -> Self {
        Self {
            log,
            observer,
            commands: None,
            connectivity: Connectivity::Unknown,
            readiness: Readiness::Unknown,
            is_new: true,
        }
    }

    /// Attach the command channel used for the load/fetch handshake
    pub fn with_commands(mut self, commands: mpsc::Sender<Command>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Ask the poller to load
    pub async fn start(&mut self) -> Result<()> {
        self.send_command(Command::Load).await
    }

    /// Apply one event
    ///
    /// # Errors
    ///
    /// Returns `Io`/`Serialization` if the session log cannot be written and
    /// `ChannelClosed` if the poller is gone when `Fetch` is due.
    pub async fn handle(&mut self, event: Event) -> Result<()> {
        match event {
            Event::LoadComplete => {
                self.observer.load_complete();
                self.send_command(Command::Fetch).await
            }
            Event::FetchComplete => {
                self.observer.fetch_complete();
                Ok(())
            }
            Event::IsConnected(connected) => {
                self.process_connection(connected);
                Ok(())
            }
            Event::Idle(idle) => {
                self.process_idle(idle);
                Ok(())
            }
            Event::New => self.begin_session().await,
            Event::Data(record) => self.record(&record).await,
        }
    }

    /// Apply one message in its named wire form
    ///
    /// Unknown or malformed messages are logged and ignored.
    pub async fn handle_wire(&mut self, message: &Value) -> Result<()> {
        match Event::from_wire(message) {
            Ok(event) => self.handle(event).await,
            Err(
                e @ (CrestLoggerError::UnknownMessage(_) | CrestLoggerError::InvalidMessage(_)),
            ) => {
                warn!("Ignoring message: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Consume events until the poller goes away or `shutdown` resolves,
    /// then seal the open log
    ///
    /// Errors from individual events are logged; only the final seal can fail.
    pub async fn run<F>(&mut self, mut events: mpsc::Receiver<Event>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let name = event.name();
                        if let Err(e) = self.handle(event).await {
                            error!("Failed to handle {} event: {}", name, e);
                        }
                    }
                    None => {
                        warn!("Poller stopped sending events");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("Shutting down...");
                    break;
                }
            }
        }

        self.shutdown().await.map(|_| ())
    }

    /// Seal the open log, if any
    pub async fn shutdown(&mut self) -> Result<Option<PathBuf>> {
        let sealed = self.log.close().await?;
        if let Some(path) = &sealed {
            self.observer.logging_complete(path);
        }
        Ok(sealed)
    }

    fn process_connection(&mut self, connected: bool) {
        let next = if connected {
            Connectivity::Connected
        } else {
            Connectivity::Disconnected
        };

        if next != self.connectivity {
            match next {
                Connectivity::Connected => self.observer.connected(),
                _ => self.observer.connecting(),
            }
            self.connectivity = next;
        }
    }

    fn process_idle(&mut self, idle: bool) {
        let next = if idle { Readiness::Idle } else { Readiness::Ready };

        if next != self.readiness {
            match next {
                Readiness::Idle => self.observer.waiting_for_data(),
                _ => self.observer.data_incoming(),
            }
            self.readiness = next;
        }
    }

    async fn begin_session(&mut self) -> Result<()> {
        self.is_new = true;
        self.shutdown().await.map(|_| ())
    }

    async fn record(&mut self, record: &NormalizedRecord) -> Result<()> {
        if self.is_new || !self.log.is_open() {
            let path = self.log.open().await?;
            self.observer.logging_started(&path);
            self.is_new = false;
        }

        self.log.append(record).await
    }

    async fn send_command(&mut self, command: Command) -> Result<()> {
        let Some(commands) = &self.commands else {
            return Ok(());
        };

        commands
            .send(command)
            .await
            .map_err(|_| {
                CrestLoggerError::ChannelClosed(format!("poller dropped {}", command.name()))
            })
    }
}
