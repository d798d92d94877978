//! The chat model as seen by the orchestration loop.
//!
//! The model is an opaque turn-taking oracle: it receives message parts and
//! answers with candidate contents made of text and tool-call parts. The
//! multi-turn history lives inside the implementation.

use async_trait::async_trait;

use oleh_core::{Part, ToolRequest};

use crate::error::ChatError;

/// A live multi-turn chat with the model.
#[async_trait]
pub trait ChatOracle: Send {
    /// Send one user message (text, inline data, or function responses)
    /// and wait for the model's reply.
    async fn send(&mut self, parts: Vec<Part>) -> Result<OracleResponse, ChatError>;
}

/// One model reply: zero or more candidates, each a sequence of parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleResponse {
    pub candidates: Vec<Vec<Part>>,
}

impl OracleResponse {
    pub fn new(candidates: Vec<Vec<Part>>) -> Self {
        Self { candidates }
    }

    /// Single-candidate reply.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            candidates: vec![parts],
        }
    }

    /// Single-candidate reply holding only text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_parts(vec![Part::text(text)])
    }

    fn first_candidate(&self) -> &[Part] {
        self.candidates.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// First tool-call part of the first candidate. Later calls are ignored.
    pub fn first_tool_request(&self) -> Option<&ToolRequest> {
        self.first_candidate()
            .iter()
            .find_map(Part::as_tool_request)
    }

    /// Concatenated text parts of the first candidate, if it has any.
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for part in self.first_candidate() {
            if let Part::Text(t) = part {
                text.get_or_insert_with(String::new).push_str(t);
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn call(name: &str) -> Part {
        Part::FunctionCall(ToolRequest::new(name, Map::new()))
    }

    #[test]
    fn test_first_tool_request_wins() {
        let response = OracleResponse::from_parts(vec![
            Part::text("Let me check."),
            call("search_aliyah_information"),
            call("find_ministry_of_aliyah_branch"),
        ]);
        assert_eq!(
            response.first_tool_request().unwrap().tool_name,
            "search_aliyah_information"
        );
    }

    #[test]
    fn test_only_first_candidate_is_inspected() {
        let response = OracleResponse::new(vec![
            vec![Part::text("plain")],
            vec![call("search_aliyah_information")],
        ]);
        assert!(response.first_tool_request().is_none());
        assert_eq!(response.text().as_deref(), Some("plain"));
    }

    #[test]
    fn test_text_concatenates_text_parts() {
        let response = OracleResponse::from_parts(vec![
            Part::text("Hello, "),
            call("x"),
            Part::text("world"),
        ]);
        assert_eq!(response.text().as_deref(), Some("Hello, world"));
    }

    #[test]
    fn test_text_absent() {
        assert!(OracleResponse::default().text().is_none());
        assert!(OracleResponse::from_parts(vec![call("x")]).text().is_none());
        assert!(OracleResponse::from_parts(vec![Part::FunctionResponse {
            name: "x".to_string(),
            response: json!({}),
        }])
        .first_tool_request()
        .is_none());
    }
}
