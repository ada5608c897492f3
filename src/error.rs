/// Failure of a single delivery attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DeliveryError {
    /// Network errors and non-2xx responses are retried alike. A payload that
    /// cannot be encoded fails the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DeliveryError::Serialization(_))
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout(value.to_string());
        }
        Self::Request(value.to_string())
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(String),
    #[error("client is closed")]
    Closed,
    #[error("runtime error: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_network_failures_are_retryable() {
        assert!(DeliveryError::Request("refused".to_string()).is_retryable());
        assert!(DeliveryError::Timeout("slow".to_string()).is_retryable());
        assert!(DeliveryError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(DeliveryError::Status {
            status: 400,
            body: "bad".to_string()
        }
        .is_retryable());
        assert!(!DeliveryError::Serialization("nan".to_string()).is_retryable());
    }

    #[test]
    fn status_error_display_includes_body() {
        let error = DeliveryError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "endpoint returned status 500: boom");
    }
}
