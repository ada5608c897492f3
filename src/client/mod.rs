//! Producer-facing client.
//!
//! A `Client` is a cheap, cloneable handle onto a single control task that
//! exclusively owns the event queue, the adaptive tuning state, and both
//! periodic timers. Producers talk to it over an unbounded channel, so no
//! caller ever touches the queue directly and every queue operation is a
//! single step of one task.
//!
//! Dispatch policy:
//! - `track` never blocks and never fails. A threshold-triggered batch is
//!   dispatched on a background task.
//! - `flush` waits for its own batch to settle and returns its report.
//! - `stop` cancels both timers, dispatches whatever is queued, and waits for
//!   that batch and every other in-flight batch before returning.
//! - Items whose retries are exhausted are logged and dropped, never
//!   re-queued.

mod actor;


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::config::ClientConfig;
use crate::delivery::{DeliveryObserver, HttpTransport, LoggingObserver, Transport};
use crate::dispatch::BatchReport;
use crate::error::ClientError;
use crate::event::LlmOutput;

use actor::ControlLoop;

/// Point-in-time view of the control task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStats {
    pub running: bool,
    pub queued: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub batches_dispatched: u64,
    pub in_flight: usize,
}

pub(crate) enum Command {
    Track(LlmOutput),
    Flush(oneshot::Sender<Option<BatchReport>>),
    Start,
    Stop(oneshot::Sender<Option<BatchReport>>),
    Stats(oneshot::Sender<ClientStats>),
    Shutdown(oneshot::Sender<Option<BatchReport>>),
}

#[derive(Clone)]
pub struct Client {
    commands: mpsc::UnboundedSender<Command>,
}

impl Client {
    /// Build a client posting over HTTP. `NEOAPI_API_KEY` / `NEOAPI_API_URL`
    /// fill in unset values. Must be called inside a Tokio runtime.
    pub fn new(mut config: ClientConfig) -> Result<Self, ClientError> {
        config.apply_env_overrides();
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_parts(config, Arc::new(transport), Arc::new(LoggingObserver))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        Self::with_parts(config, transport, Arc::new(LoggingObserver))
    }

    pub fn with_parts(
        mut config: ClientConfig,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn DeliveryObserver>,
    ) -> Result<Self, ClientError> {
        config.apply_env_overrides();
        config.validate()?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ClientError::Runtime(format!("no Tokio runtime available: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let control = ControlLoop::new(&config, transport, observer, rx);
        runtime.spawn(control.run());

        Ok(Self { commands: tx })
    }

    /// Enqueue an event. Dispatches a batch in the background once the queue
    /// reaches the current batch size. Delivery failures never surface here.
    pub fn track(&self, event: LlmOutput) {
        if self.commands.send(Command::Track(event)).is_err() {
            warn!("client is closed, dropping tracked event");
        }
    }

    /// Dispatch everything queued now and wait for it to settle. `None` when
    /// the queue was empty.
    pub async fn flush(&self) -> Result<Option<BatchReport>, ClientError> {
        self.request(Command::Flush).await
    }

    /// Arm the flush and adjustment timers. No-op when already running.
    pub fn start(&self) -> Result<(), ClientError> {
        self.commands
            .send(Command::Start)
            .map_err(|_| ClientError::Closed)
    }

    /// Cancel both timers and drain the queue. No-op (returns `None`) when
    /// not running.
    pub async fn stop(&self) -> Result<Option<BatchReport>, ClientError> {
        self.request(Command::Stop).await
    }

    pub async fn stats(&self) -> Result<ClientStats, ClientError> {
        self.request(Command::Stats).await
    }

    /// Stop, drain, and close the control task. Other handles to the same
    /// client drop their events afterwards.
    pub async fn shutdown(self) -> Result<Option<BatchReport>, ClientError> {
        self.request(Command::Shutdown).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .map_err(|_| ClientError::Closed)?;
        rx.await.map_err(|_| ClientError::Closed)
    }
}
