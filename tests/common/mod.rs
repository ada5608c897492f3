//! Shared fakes for client integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;

use neoapi::{AnalysisResult, DeliveryError, DeliveryObserver, Endpoint, LlmOutput, Transport};

/// Records every event it is handed and always succeeds.
#[derive(Default)]
pub struct RecordingTransport {
    received: Mutex<Vec<(Endpoint, LlmOutput)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(Endpoint, LlmOutput)> {
        self.received.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.received()
            .into_iter()
            .map(|(_, event)| event.text)
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, endpoint: Endpoint, event: &LlmOutput) -> Result<String, DeliveryError> {
        self.received.lock().unwrap().push((endpoint, event.clone()));
        Ok("{}".to_string())
    }
}

#[derive(Default)]
pub struct CollectingObserver {
    analyses: Mutex<Vec<AnalysisResult>>,
    failures: Mutex<Vec<(String, u32, String)>>,
}

impl CollectingObserver {
    pub fn analyses(&self) -> Vec<AnalysisResult> {
        self.analyses.lock().unwrap().clone()
    }

    /// `(text, attempts, error)` for every dropped event.
    pub fn failures(&self) -> Vec<(String, u32, String)> {
        self.failures.lock().unwrap().clone()
    }
}

impl DeliveryObserver for CollectingObserver {
    fn on_analysis(&self, _event: &LlmOutput, analysis: &AnalysisResult) {
        self.analyses.lock().unwrap().push(analysis.clone());
    }

    fn on_delivery_failed(&self, event: &LlmOutput, attempts: u32, error: &DeliveryError) {
        self.failures
            .lock()
            .unwrap()
            .push((event.text.clone(), attempts, error.to_string()));
    }
}
