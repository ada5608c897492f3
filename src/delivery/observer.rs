use tracing::info;

use crate::error::DeliveryError;
use crate::event::{AnalysisResult, LlmOutput};

/// Receives delivery outcomes that never reach the producer's control flow.
pub trait DeliveryObserver: Send + Sync {
    fn on_analysis(&self, event: &LlmOutput, analysis: &AnalysisResult);

    /// Called once per item whose retries were exhausted. The item is dropped
    /// afterwards; the worker has already logged the failure.
    fn on_delivery_failed(&self, _event: &LlmOutput, _attempts: u32, _error: &DeliveryError) {}
}

/// Default observer: writes analysis results to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl DeliveryObserver for LoggingObserver {
    fn on_analysis(&self, event: &LlmOutput, analysis: &AnalysisResult) {
        info!(
            timestamp = event.timestamp,
            "analysis response: {}", analysis.rendered
        );
    }
}
