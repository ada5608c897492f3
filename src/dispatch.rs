//! Fan-out of an extracted batch to the delivery worker.
//!
//! Sampling policy: with `check_frequency = N`, only positions `0, N, 2N, ...`
//! of a batch are sent. The other positions are dropped on purpose, without
//! retry, as load shedding. `N = 1` sends everything.

use futures::future::join_all;
use tracing::debug;
use uuid::Uuid;

use crate::delivery::{DeliveryOutcome, DeliveryWorker};
use crate::event::LlmOutput;
use crate::queue::{Batch, FlushTrigger};

/// Settled result of one dispatched batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub trigger: FlushTrigger,
    pub size: usize,
    pub sampled_out: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn dispatched(&self) -> usize {
        self.delivered + self.failed
    }
}

pub struct BatchDispatcher {
    worker: DeliveryWorker,
    check_frequency: usize,
}

impl BatchDispatcher {
    pub fn new(worker: DeliveryWorker, check_frequency: usize) -> Self {
        Self {
            worker,
            check_frequency: check_frequency.max(1),
        }
    }

    /// Send every selected event concurrently and wait for all of them to
    /// settle. Sends are initiated in batch order.
    pub async fn dispatch(&self, batch: Batch) -> BatchReport {
        let selected = sample(&batch.events, self.check_frequency);
        let sampled_out = batch.len() - selected.len();

        debug!(
            batch_id = %batch.id,
            trigger = %batch.trigger,
            "dispatching {} of {} events",
            selected.len(),
            batch.len()
        );

        let outcomes = join_all(selected.into_iter().map(|event| self.worker.deliver(event))).await;
        let delivered = outcomes
            .iter()
            .filter(|outcome| outcome.is_delivered())
            .count();
        let failed = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, DeliveryOutcome::Failed { .. }))
            .count();

        let report = BatchReport {
            batch_id: batch.id,
            trigger: batch.trigger,
            size: batch.len(),
            sampled_out,
            delivered,
            failed,
        };
        debug!(
            batch_id = %report.batch_id,
            "batch settled: {} delivered, {} failed, {} sampled out",
            report.delivered,
            report.failed,
            report.sampled_out
        );
        report
    }
}

pub fn sample(events: &[LlmOutput], check_frequency: usize) -> Vec<&LlmOutput> {
    let stride = check_frequency.max(1);
    events
        .iter()
        .enumerate()
        .filter(|(index, _)| index % stride == 0)
        .map(|(_, event)| event)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::queue::EventQueue;
    use crate::testing::{fast_retry, CollectingObserver, ScriptedTransport};

    fn events(count: usize) -> Vec<LlmOutput> {
        (0..count)
            .map(|i| LlmOutput::at(format!("event-{i}"), i as i64))
            .collect()
    }

    fn batch_of(count: usize) -> Batch {
        let mut queue = EventQueue::new();
        for event in events(count) {
            queue.enqueue(event);
        }
        queue.extract_all(FlushTrigger::Manual).unwrap()
    }

    fn dispatcher(transport: &Arc<ScriptedTransport>, check_frequency: usize) -> BatchDispatcher {
        let worker = DeliveryWorker::new(
            transport.clone(),
            Arc::new(CollectingObserver::default()),
            2,
            fast_retry(),
        );
        BatchDispatcher::new(worker, check_frequency)
    }

    #[test]
    fn stride_selects_every_nth_position() {
        let all = events(7);
        let texts = |selected: Vec<&LlmOutput>| -> Vec<String> {
            selected.into_iter().map(|e| e.text.clone()).collect()
        };

        assert_eq!(texts(sample(&all, 1)).len(), 7);
        assert_eq!(
            texts(sample(&all, 2)),
            vec!["event-0", "event-2", "event-4", "event-6"]
        );
        assert_eq!(texts(sample(&all, 3)), vec!["event-0", "event-3", "event-6"]);
        assert_eq!(texts(sample(&all, 0)).len(), 7);
    }

    #[tokio::test]
    async fn delivers_every_event_without_sampling() {
        let transport = Arc::new(ScriptedTransport::new());
        let report = dispatcher(&transport, 1).dispatch(batch_of(4)).await;

        assert_eq!(report.size, 4);
        assert_eq!(report.delivered, 4);
        assert_eq!(report.sampled_out, 0);
        assert_eq!(
            transport.texts(),
            vec!["event-0", "event-1", "event-2", "event-3"]
        );
    }

    #[tokio::test]
    async fn sampling_drops_odd_positions_without_error() {
        let transport = Arc::new(ScriptedTransport::new());
        let report = dispatcher(&transport, 2).dispatch(batch_of(5)).await;

        assert_eq!(report.delivered, 3);
        assert_eq!(report.sampled_out, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(transport.texts(), vec!["event-0", "event-2", "event-4"]);
    }

    #[tokio::test]
    async fn one_failed_item_does_not_fail_the_batch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail_text("event-1", 500);
        let report = dispatcher(&transport, 1).dispatch(batch_of(3)).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.dispatched(), 3);
        // event-1 tried twice, the others once
        assert_eq!(transport.calls().len(), 4);
    }
}
