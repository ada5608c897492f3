//! Per-event delivery to the collector.
//!
//! - `transport`: single HTTP exchange per call (`Transport`, `HttpTransport`)
//! - `worker`: retry/backoff loop and endpoint selection (`DeliveryWorker`)
//! - `observer`: sink for analysis results and terminal failures

pub mod observer;
pub mod transport;
pub mod worker;

pub use observer::{DeliveryObserver, LoggingObserver};
pub use transport::{Endpoint, HttpTransport, Transport};
pub use worker::{DeliveryOutcome, DeliveryWorker};
