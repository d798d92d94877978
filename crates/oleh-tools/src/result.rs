//! Tool outcomes as seen by the orchestration loop.

use serde_json::{json, Value};

use oleh_core::Row;

/// Outcome of one tool call.
///
/// `Error` is a sentinel returned through the normal channel: it reaches
/// the model as a single `{"error": message}` row, never as a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Text(String),
    Rows(Vec<Row>),
    Error(String),
}

impl ToolResult {
    /// Build the sentinel error value.
    pub fn error(message: impl Into<String>) -> Self {
        ToolResult::Error(message.into())
    }

    /// Row view of the result. `None` for text results.
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            ToolResult::Text(_) => None,
            ToolResult::Rows(rows) => Some(rows),
            ToolResult::Error(message) => {
                let mut row = Row::new();
                row.insert("error".to_string(), Value::String(message));
                Some(vec![row])
            }
        }
    }

    /// Body of the function-response message sent back to the model.
    pub fn to_payload(&self) -> Value {
        let content = match self {
            ToolResult::Text(text) => Value::String(text.clone()),
            ToolResult::Rows(rows) => Value::Array(rows.iter().cloned().map(Value::Object).collect()),
            ToolResult::Error(message) => json!([{ "error": message }]),
        };
        json!({ "content": content })
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolResult::Text(_) => "text",
            ToolResult::Rows(_) => "rows",
            ToolResult::Error(_) => "error",
        }
    }
}
