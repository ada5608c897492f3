//! Wrap ordinary functions so their return values are tracked as events.
//!
//! ```ignore
//! let summarize = instrument(client.clone(), TrackOptions::default(), |doc: String| {
//!     format!("summary of {doc}")
//! });
//! let summary = summarize("report".to_string()); // also tracked
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;

use serde::Serialize;
use tracing::warn;

use crate::client::Client;
use crate::event::LlmOutput;

/// Metadata stamped onto every event produced by an instrumented call.
#[derive(Debug, Clone)]
pub struct TrackOptions {
    pub project: String,
    pub group: String,
    pub analysis_slug: Option<String>,
    pub need_analysis_response: bool,
    pub format_json_output: bool,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub save_text: bool,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            project: "default_project".to_string(),
            group: "default_group".to_string(),
            analysis_slug: None,
            need_analysis_response: false,
            format_json_output: false,
            metadata: None,
            save_text: true,
        }
    }
}

impl TrackOptions {
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn analyze(mut self, format_json_output: bool) -> Self {
        self.need_analysis_response = true;
        self.format_json_output = format_json_output;
        self
    }

    /// Build the event for one call result. String results are tracked
    /// verbatim; anything else as its JSON text.
    pub fn event_for<T: Serialize>(&self, result: &T) -> LlmOutput {
        let response = serde_json::to_value(result).unwrap_or(serde_json::Value::Null);
        let text = match &response {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };

        let mut event = LlmOutput::new(text);
        event.model = Some("unknown".to_string());
        event.prompt_tokens = Some(0);
        event.completion_tokens = Some(0);
        event.total_tokens = Some(0);
        event.cost = Some(0.0);
        event.response = Some(response);
        event.project = Some(self.project.clone());
        event.group = Some(self.group.clone());
        event.analysis_slug = self.analysis_slug.clone();
        event.metadata = self.metadata.clone();
        event.need_analysis_response = Some(self.need_analysis_response);
        event.format_json_output = Some(self.format_json_output);
        event.save_text = Some(self.save_text);
        event
    }
}

/// Return a wrapper that calls `f` and tracks every result.
pub fn instrument<A, T, F>(client: Client, options: TrackOptions, f: F) -> impl Fn(A) -> T
where
    F: Fn(A) -> T,
    T: Serialize,
{
    move |args| {
        let result = f(args);
        client.track(options.event_for(&result));
        result
    }
}

/// Like [`instrument`], for fallible functions: only `Ok` values are tracked,
/// errors are logged and passed through untouched.
pub fn instrument_result<A, T, E, F>(
    client: Client,
    options: TrackOptions,
    f: F,
) -> impl Fn(A) -> Result<T, E>
where
    F: Fn(A) -> Result<T, E>,
    T: Serialize,
    E: Display,
{
    move |args| match f(args) {
        Ok(value) => {
            client.track(options.event_for(&value));
            Ok(value)
        }
        Err(e) => {
            warn!("instrumented call failed, nothing tracked: {e}");
            Err(e)
        }
    }
}

/// Await `fut` and track its output.
pub async fn track_future<T, Fut>(client: &Client, options: &TrackOptions, fut: Fut) -> T
where
    Fut: Future<Output = T>,
    T: Serialize,
{
    let result = fut.await;
    client.track(options.event_for(&result));
    result
}
