use crate::transport::TransportError;
use std::sync::Arc;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "rate_limit.window_ms")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "url_resolver")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for request orchestration.
///
/// Errors are `Clone` because every caller that joined a deduplicated request
/// receives the same settled outcome.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP {status}: {status_text}")]
    Status { status: u16, status_text: String },

    #[error("Decode error ({content_type}): {message}")]
    Decode {
        content_type: String,
        message: String,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(Arc<serde_json::Error>),

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(Arc::new(err))
    }
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

/// Client errors that a retry cannot fix.
const NON_RETRYABLE_STATUS: [u16; 4] = [400, 401, 403, 404];

impl Error {
    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn decode(content_type: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Decode {
            content_type: content_type.into(),
            message: message.into(),
        }
    }

    /// Whether repeating the attempt could change the outcome.
    ///
    /// Timeouts, aborts, decode failures and 400/401/403/404 responses are final.
    /// Other HTTP statuses and connection-level failures are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(TransportError::Aborted) => false,
            Error::Transport(_) => true,
            Error::Status { status, .. } => !NON_RETRYABLE_STATUS.contains(status),
            Error::Timeout { .. }
            | Error::Decode { .. }
            | Error::Configuration { .. }
            | Error::Serialization(_)
            | Error::Runtime { .. } => false,
        }
    }

    /// HTTP status carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> Error {
        Error::Status {
            status: code,
            status_text: "x".into(),
        }
    }

    #[test]
    fn test_client_errors_are_final() {
        for code in [400, 401, 403, 404] {
            assert!(!status(code).is_retryable(), "{} should not retry", code);
        }
    }

    #[test]
    fn test_other_statuses_retry() {
        for code in [408, 409, 429, 500, 502, 503] {
            assert!(status(code).is_retryable(), "{} should retry", code);
        }
    }

    #[test]
    fn test_timeout_and_abort_are_final() {
        assert!(!Error::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(!Error::Transport(TransportError::Aborted).is_retryable());
        assert!(Error::Transport(TransportError::Other("reset".into())).is_retryable());
        assert!(!Error::decode("application/json", "eof").is_retryable());
    }

    #[test]
    fn test_status_display() {
        let err = Error::Status {
            status: 404,
            status_text: "Not Found".into(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_context_formatting() {
        let err = Error::configuration_with_context(
            "window must be positive",
            ErrorContext::new()
                .with_field_path("rate_limit.window_ms")
                .with_source("config"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: window must be positive (field: rate_limit.window_ms, source: config)"
        );
        assert!(err.context().is_some());
    }
}
