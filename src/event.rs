//! Event record produced by callers and shipped to the collector.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One tracked LLM output. Serialized with camelCase keys; unset optional
/// fields are omitted from the wire payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmOutput {
    pub text: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_analysis_response: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_json_output: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_text: Option<bool>,
}

impl LlmOutput {
    /// Build an event stamped with the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(text, Utc::now().timestamp_millis())
    }

    pub fn at(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            timestamp,
            model: None,
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
            cost: None,
            response: None,
            project: None,
            group: None,
            analysis_slug: None,
            metadata: None,
            need_analysis_response: None,
            format_json_output: None,
            save_text: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_tokens(mut self, prompt: u64, completion: u64) -> Self {
        self.prompt_tokens = Some(prompt);
        self.completion_tokens = Some(completion);
        self.total_tokens = Some(prompt.saturating_add(completion));
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Route this event to the analyze endpoint and surface the result.
    pub fn with_analysis(mut self, format_json_output: bool) -> Self {
        self.need_analysis_response = Some(true);
        self.format_json_output = Some(format_json_output);
        self
    }

    pub fn needs_analysis(&self) -> bool {
        self.need_analysis_response.unwrap_or(false)
    }

    pub fn formats_json_output(&self) -> bool {
        self.format_json_output.unwrap_or(false)
    }
}

/// Body returned by the analyze endpoint, with the text handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub body: serde_json::Value,
    /// Pretty-printed JSON when the event asked for formatted output,
    /// otherwise the body as received.
    pub rendered: String,
}

impl AnalysisResult {
    pub fn from_response(raw: &str, format_json_output: bool) -> Self {
        let body = serde_json::from_str::<serde_json::Value>(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        let rendered = if format_json_output {
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| raw.to_string())
        } else {
            raw.to_string()
        };
        Self { body, rendered }
    }
}
