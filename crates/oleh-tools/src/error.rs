//! Error types for tool execution.
//!
//! These never escape a tool call: each tool folds them into an in-band
//! `ToolResult` before returning to the orchestration loop.

/// Errors raised inside a tool boundary.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("could not decode backend response: {0}")]
    Decode(String),
    #[error("{0}")]
    Store(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::Transport(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        assert_eq!(
            ToolError::InvalidArguments("missing query".to_string()).to_string(),
            "invalid arguments: missing query"
        );
        assert_eq!(
            ToolError::Backend {
                status: 403,
                message: "permission denied".to_string()
            }
            .to_string(),
            "backend returned 403: permission denied"
        );
        assert_eq!(
            ToolError::Store("no such table: x".to_string()).to_string(),
            "no such table: x"
        );
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: ToolError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ToolError::Decode(_)));
    }
}
