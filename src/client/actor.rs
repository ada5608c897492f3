use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::adaptive::{AdaptiveController, Tuning};
use crate::config::ClientConfig;
use crate::delivery::{DeliveryObserver, DeliveryWorker, Transport};
use crate::dispatch::{BatchDispatcher, BatchReport};
use crate::queue::{EventQueue, FlushTrigger};

use super::{ClientStats, Command};

type ReportReply = oneshot::Sender<Option<BatchReport>>;

/// The single task that owns the queue and both timers.
pub(super) struct ControlLoop {
    commands: mpsc::UnboundedReceiver<Command>,
    queue: EventQueue,
    tuning: Tuning,
    controller: AdaptiveController,
    dispatcher: Arc<BatchDispatcher>,
    adjustment_interval: Duration,
    flush_timer: Option<Interval>,
    adjust_timer: Option<Interval>,
    in_flight: JoinSet<BatchReport>,
    batches_dispatched: u64,
}

impl ControlLoop {
    pub(super) fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn DeliveryObserver>,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let worker = DeliveryWorker::from_config(config, transport, observer);
        Self {
            commands,
            queue: EventQueue::new(),
            tuning: Tuning::from_config(config),
            controller: AdaptiveController::from_config(config),
            dispatcher: Arc::new(BatchDispatcher::new(worker, config.check_frequency)),
            adjustment_interval: config.adjustment_interval(),
            flush_timer: None,
            adjust_timer: None,
            in_flight: JoinSet::new(),
            batches_dispatched: 0,
        }
    }

    pub(super) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    if !self.handle(command).await {
                        return;
                    }
                }
                _ = next_tick(&mut self.flush_timer) => {
                    self.dispatch(FlushTrigger::Timer, None);
                }
                _ = next_tick(&mut self.adjust_timer) => {
                    self.adjust();
                }
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    settled(joined);
                }
            }
        }

        // Every handle is gone; deliver what is left before exiting.
        self.finish().await;
        debug!("client control task exited");
    }

    /// Returns `false` once the loop should exit.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Track(event) => {
                self.queue.enqueue(event);
                if self.queue.len() >= self.tuning.batch_size {
                    self.dispatch(FlushTrigger::Threshold, None);
                }
            }
            Command::Flush(reply) => self.dispatch(FlushTrigger::Manual, Some(reply)),
            Command::Start => self.start(),
            Command::Stop(reply) => {
                let report = if self.is_running() {
                    let report = self.finish().await;
                    info!("client stopped");
                    report
                } else {
                    None
                };
                let _ = reply.send(report);
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.stats());
            }
            Command::Shutdown(reply) => {
                let report = self.finish().await;
                info!("client shut down");
                let _ = reply.send(report);
                return false;
            }
        }
        true
    }

    fn is_running(&self) -> bool {
        self.flush_timer.is_some()
    }

    fn start(&mut self) {
        if self.is_running() {
            debug!("client already running");
            return;
        }
        self.flush_timer = Some(periodic(self.tuning.flush_interval));
        self.adjust_timer = Some(periodic(self.adjustment_interval));
        info!(
            "client started (batch size {}, flush every {:?})",
            self.tuning.batch_size, self.tuning.flush_interval
        );
    }

    /// Extract the whole queue and hand it to a background dispatch. The reply,
    /// if any, receives the report once the batch settles.
    fn dispatch(&mut self, trigger: FlushTrigger, reply: Option<ReportReply>) {
        let Some(batch) = self.queue.extract_all(trigger) else {
            if let Some(reply) = reply {
                let _ = reply.send(None);
            }
            return;
        };

        self.batches_dispatched += 1;
        let dispatcher = self.dispatcher.clone();
        self.in_flight.spawn(async move {
            let report = dispatcher.dispatch(batch).await;
            if let Some(reply) = reply {
                let _ = reply.send(Some(report.clone()));
            }
            report
        });
    }

    fn adjust(&mut self) {
        let depth = self.queue.len();
        let adjustment = self.controller.adjust(&mut self.tuning, depth);
        if adjustment.is_noop() {
            return;
        }

        debug!(
            depth,
            "retuned batch size to {} and flush interval to {:?}",
            self.tuning.batch_size,
            self.tuning.flush_interval
        );
        if adjustment.flush_interval_changed && self.is_running() {
            self.flush_timer = Some(periodic(self.tuning.flush_interval));
        }
    }

    /// Cancel both timers, dispatch the remaining queue, and wait for every
    /// in-flight batch.
    async fn finish(&mut self) -> Option<BatchReport> {
        self.flush_timer = None;
        self.adjust_timer = None;

        let (tx, rx) = oneshot::channel();
        self.dispatch(FlushTrigger::Stop, Some(tx));
        while let Some(joined) = self.in_flight.join_next().await {
            settled(joined);
        }
        rx.await.ok().flatten()
    }

    fn stats(&self) -> ClientStats {
        ClientStats {
            running: self.is_running(),
            queued: self.queue.len(),
            batch_size: self.tuning.batch_size,
            flush_interval: self.tuning.flush_interval,
            batches_dispatched: self.batches_dispatched,
            in_flight: self.in_flight.len(),
        }
    }
}

fn settled(joined: Result<BatchReport, JoinError>) {
    match joined {
        Ok(report) if report.failed > 0 => {
            warn!(
                batch_id = %report.batch_id,
                "{} of {} events in batch were dropped after exhausting retries",
                report.failed,
                report.size
            );
        }
        Ok(_) => {}
        Err(e) => error!("batch dispatch task failed: {e}"),
    }
}

/// First tick fires one full period after arming.
fn periodic(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
