//! Error types for the DeskPilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` wraps them all.

use thiserror::Error;

/// The top-level error type for all DeskPilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Remote desktop errors ---
    #[error("Remote desktop error: {0}")]
    Remote(#[from] RemoteError),

    // --- Screenshot errors ---
    #[error("Screenshot error: {0}")]
    Screenshot(#[from] ScreenshotError),

    // --- Execution errors ---
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures reported by a [`ModelClient`](crate::model::ModelClient).
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider (429): {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures reported by a [`RemoteDesktop`](crate::remote::RemoteDesktop).
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("Remote desktop unavailable: {0}")]
    Unavailable(String),

    #[error("Input operation `{operation}` failed: {reason}")]
    InputFailed { operation: String, reason: String },

    #[error("Screenshot capture failed: {0}")]
    CaptureFailed(String),

    #[error("Invalid display resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error(transparent)]
    Capture(#[from] RemoteError),

    #[error("Failed to decode screenshot: {0}")]
    Decode(String),

    #[error("Failed to encode screenshot: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Action `{action}` failed: {source}")]
    Remote {
        action: &'static str,
        #[source]
        source: RemoteError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_displays_correctly() {
        let err = Error::Model(ModelError::ApiError {
            status_code: 503,
            message: "backend overloaded".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("backend overloaded"));
    }

    #[test]
    fn rate_limit_mentions_status_code() {
        let err = ModelError::RateLimited("slow down".into());
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn execution_error_names_the_action() {
        let err = ExecutionError::Remote {
            action: "click",
            source: RemoteError::InputFailed {
                operation: "click_at".into(),
                reason: "xdotool exited 1".into(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("click"));
        assert!(text.contains("xdotool"));
    }
}
