use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event::LlmOutput;

/// What caused a batch to be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Queue length reached the current batch size inside `track`.
    Threshold,
    /// Periodic flush timer.
    Timer,
    /// Explicit `flush()` call.
    Manual,
    /// Final flush performed by `stop()` or shutdown.
    Stop,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushTrigger::Threshold => write!(f, "threshold"),
            FlushTrigger::Timer => write!(f, "timer"),
            FlushTrigger::Manual => write!(f, "manual"),
            FlushTrigger::Stop => write!(f, "stop"),
        }
    }
}

/// Snapshot of the queue taken at one instant. Detached from the live queue.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: Uuid,
    pub trigger: FlushTrigger,
    pub extracted_at: DateTime<Utc>,
    pub events: Vec<LlmOutput>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Ordered, unbounded buffer of pending events.
///
/// Owned by the client control task; it is never shared, so `extract_all`
/// taking `&mut self` is the whole atomicity story.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<LlmOutput>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, event: LlmOutput) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take the entire contents and leave the queue empty in the same step.
    /// Returns `None` rather than an empty batch.
    pub fn extract_all(&mut self, trigger: FlushTrigger) -> Option<Batch> {
        if self.events.is_empty() {
            return None;
        }
        Some(Batch {
            id: Uuid::new_v4(),
            trigger,
            extracted_at: Utc::now(),
            events: std::mem::take(&mut self.events),
        })
    }
}
