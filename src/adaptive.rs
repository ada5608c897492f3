//! Self-tuning of batch size and flush interval from observed backlog.

use std::time::Duration;

use crate::config::ClientConfig;

pub const BATCH_SIZE_STEP: usize = 5;
pub const FLUSH_INTERVAL_STEP: Duration = Duration::from_millis(500);

/// The two knobs the controller is allowed to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Tuning {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            flush_interval: config.flush_interval(),
        }
    }
}

/// Changes applied by one adjustment tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Adjustment {
    pub batch_size_changed: bool,
    pub flush_interval_changed: bool,
}

impl Adjustment {
    pub fn is_noop(&self) -> bool {
        !self.batch_size_changed && !self.flush_interval_changed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdaptiveController {
    min_batch_size: usize,
    max_batch_size: usize,
    min_flush_interval: Duration,
    max_flush_interval: Duration,
}

impl AdaptiveController {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            min_batch_size: config.min_batch_size,
            max_batch_size: config.max_batch_size,
            min_flush_interval: Duration::from_millis(config.min_flush_interval_ms),
            max_flush_interval: Duration::from_millis(config.max_flush_interval_ms),
        }
    }

    /// Retune from the queue depth observed before this tick's flush.
    ///
    /// The flush interval rule compares against the batch size as updated
    /// by the first rule.
    pub fn adjust(&self, tuning: &mut Tuning, depth: usize) -> Adjustment {
        let mut adjustment = Adjustment::default();
        // depth > batch * 1.5 and depth < batch * 0.5, kept in integers
        let doubled = depth * 2;

        if doubled > tuning.batch_size * 3 && tuning.batch_size < self.max_batch_size {
            tuning.batch_size = (tuning.batch_size + BATCH_SIZE_STEP).min(self.max_batch_size);
            adjustment.batch_size_changed = true;
        } else if doubled < tuning.batch_size && tuning.batch_size > self.min_batch_size {
            tuning.batch_size = tuning
                .batch_size
                .saturating_sub(BATCH_SIZE_STEP)
                .max(self.min_batch_size);
            adjustment.batch_size_changed = true;
        }

        if depth > tuning.batch_size * 2 && tuning.flush_interval > self.min_flush_interval {
            tuning.flush_interval = tuning
                .flush_interval
                .saturating_sub(FLUSH_INTERVAL_STEP)
                .max(self.min_flush_interval);
            adjustment.flush_interval_changed = true;
        } else if depth < tuning.batch_size && tuning.flush_interval < self.max_flush_interval {
            tuning.flush_interval =
                (tuning.flush_interval + FLUSH_INTERVAL_STEP).min(self.max_flush_interval);
            adjustment.flush_interval_changed = true;
        }

        adjustment
    }
}
