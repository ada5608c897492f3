//! Client-side telemetry pipeline for LLM output events.
//!
//! Producers hand events to [`Client::track`]; everything after that is owned
//! by the pipeline: buffering, batching, adaptive tuning, delivery, and retry.
//!
//! # Architecture
//!
//! - `queue`: ordered in-memory buffer and atomic whole-queue extraction
//! - `dispatch`: sampling stride and concurrent fan-out of one batch
//! - `delivery`: per-event HTTP delivery with exponential backoff
//! - `adaptive`: retunes batch size and flush interval from backlog
//! - `client`: control task owning queue + timers, and the producer handle
//! - `instrument`: wrap functions so their results are tracked
//!
//! Nothing is persisted: events still queued when the process dies are lost.

pub mod adaptive;
pub mod client;
pub mod config;
pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod instrument;
pub mod queue;

#[cfg(test)]
mod testing;

pub use client::{Client, ClientStats};
pub use config::{ClientConfig, RetryPolicy};
pub use delivery::{DeliveryObserver, Endpoint, LoggingObserver, Transport};
pub use dispatch::BatchReport;
pub use error::{ClientError, DeliveryError};
pub use event::{AnalysisResult, LlmOutput};
pub use instrument::{instrument, instrument_result, track_future, TrackOptions};
pub use queue::FlushTrigger;

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting to
/// `neoapi=debug,info`. Later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("neoapi=debug,info")),
        )
        .try_init();
}
