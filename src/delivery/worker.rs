use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::DeliveryError;
use crate::event::{AnalysisResult, LlmOutput};

use super::observer::DeliveryObserver;
use super::transport::{Endpoint, Transport};

/// Terminal state of one item.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Failed { attempts: u32, error: DeliveryError },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } | DeliveryOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Sends single events, retrying with exponential backoff.
///
/// Attempts are numbered from 1. After a failed attempt `n < max_retries` the
/// worker sleeps `retry.backoff(n)` and tries again; attempt `max_retries` is
/// the last one.
pub struct DeliveryWorker {
    transport: Arc<dyn Transport>,
    observer: Arc<dyn DeliveryObserver>,
    max_retries: u32,
    retry: RetryPolicy,
}

impl DeliveryWorker {
    pub fn new(
        transport: Arc<dyn Transport>,
        observer: Arc<dyn DeliveryObserver>,
        max_retries: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            observer,
            max_retries: max_retries.max(1),
            retry,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn DeliveryObserver>,
    ) -> Self {
        Self::new(transport, observer, config.max_retries, config.retry)
    }

    pub async fn deliver(&self, event: &LlmOutput) -> DeliveryOutcome {
        let endpoint = Endpoint::for_event(event);
        let mut attempt = 1;

        loop {
            match self.transport.post(endpoint, event).await {
                Ok(body) => {
                    debug!("delivered event to {endpoint} on attempt {attempt}");
                    if endpoint == Endpoint::Analyze {
                        let analysis =
                            AnalysisResult::from_response(&body, event.formats_json_output());
                        self.observer.on_analysis(event, &analysis);
                    }
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) => {
                    if !e.is_retryable() || attempt >= self.max_retries {
                        return self.fail(event, attempt, e);
                    }

                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "delivery to {endpoint} failed (attempt {attempt}/{}): {e}, retrying in {delay:?}",
                        self.max_retries
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn fail(&self, event: &LlmOutput, attempts: u32, error: DeliveryError) -> DeliveryOutcome {
        error!(
            timestamp = event.timestamp,
            "failed to send event after {attempts} attempts: {error}"
        );
        self.observer.on_delivery_failed(event, attempts, &error);
        DeliveryOutcome::Failed { attempts, error }
    }
}
