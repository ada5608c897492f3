//! Shared fixtures for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::RetryPolicy;
use crate::delivery::{DeliveryObserver, Endpoint, Transport};
use crate::error::DeliveryError;
use crate::event::{AnalysisResult, LlmOutput};

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        base_delay_ms: 1,
        max_delay_ms: 5,
    }
}

/// Transport that replays queued outcomes and records every call in order.
/// With nothing queued, calls succeed with `{}`.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String, DeliveryError>>>,
    failing_texts: Mutex<HashMap<String, u16>>,
    calls: Mutex<Vec<(Endpoint, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, status: u16) {
        self.push_error(DeliveryError::Status {
            status,
            body: "scripted failure".to_string(),
        });
    }

    pub fn push_error(&self, error: DeliveryError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn push_body(&self, body: &str) {
        self.script.lock().unwrap().push_back(Ok(body.to_string()));
    }

    /// Every attempt for an event with this text fails with `status`.
    pub fn fail_text(&self, text: &str, status: u16) {
        self.failing_texts
            .lock()
            .unwrap()
            .insert(text.to_string(), status);
    }

    pub fn calls(&self) -> Vec<(Endpoint, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(_, body)| {
                serde_json::from_str::<LlmOutput>(&body)
                    .map(|event| event.text)
                    .unwrap_or(body)
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, endpoint: Endpoint, event: &LlmOutput) -> Result<String, DeliveryError> {
        let body = serde_json::to_string(event)?;
        self.calls.lock().unwrap().push((endpoint, body));

        if let Some(status) = self.failing_texts.lock().unwrap().get(&event.text) {
            return Err(DeliveryError::Status {
                status: *status,
                body: String::new(),
            });
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("{}".to_string()))
    }
}

#[derive(Default)]
pub struct CollectingObserver {
    analyses: Mutex<Vec<AnalysisResult>>,
    failures: Mutex<Vec<(String, u32)>>,
}

impl CollectingObserver {
    pub fn analyses(&self) -> Vec<AnalysisResult> {
        self.analyses.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<(String, u32)> {
        self.failures.lock().unwrap().clone()
    }
}

impl DeliveryObserver for CollectingObserver {
    fn on_analysis(&self, _event: &LlmOutput, analysis: &AnalysisResult) {
        self.analyses.lock().unwrap().push(analysis.clone());
    }

    fn on_delivery_failed(&self, event: &LlmOutput, attempts: u32, _error: &DeliveryError) {
        self.failures
            .lock()
            .unwrap()
            .push((event.text.clone(), attempts));
    }
}
