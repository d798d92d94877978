//! Knowledge-base search tool.
//!
//! Sends one query to the search backend and reduces the returned documents
//! to a bullet list, one line per usable piece of content, each followed by
//! its source link when the document has one.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::registry::ChatTool;
use crate::result::ToolResult;
use crate::schema::{ParamKind, ParamSpec, ToolSchema};

pub const SEARCH_TOOL_NAME: &str = "search_aliyah_information";

/// Returned when the backend found no documents at all.
pub const NO_INFORMATION_FOUND: &str = "No specific information found regarding your question.";

/// Returned when documents came back but none carried usable content.
pub const NO_ANSWER_FOUND: &str =
    "I could not find an answer to your question. Try rephrasing your question or being more specific.";

pub const SEARCH_ERROR_PREFIX: &str = "Error searching knowledge base: ";

/// Placeholder the backend puts in place of a missing snippet.
const EMPTY_SNIPPET_PLACEHOLDER: &str = "No snippet is available for this page.";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub page_size: u32,
    pub content_search_spec: ContentSearchSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSearchSpec {
    pub extractive_content_spec: ExtractiveContentSpec,
    pub snippet_spec: SnippetSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractiveContentSpec {
    pub max_extractive_segment_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetSpec {
    pub return_snippet: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, page_size: u32, max_segments: u32) -> Self {
        Self {
            query: query.into(),
            page_size,
            content_search_spec: ContentSearchSpec {
                extractive_content_spec: ExtractiveContentSpec {
                    max_extractive_segment_count: max_segments,
                },
                snippet_spec: SnippetSpec {
                    return_snippet: true,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub document: Option<SearchDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    #[serde(default)]
    pub derived_struct_data: Option<DerivedData>,
}

/// Derived fields of a result document. Keys arrive in snake_case.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DerivedData {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub extractive_segments: Vec<ExtractiveSegment>,
    #[serde(default)]
    pub snippets: Vec<Snippet>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractiveSegment {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snippet {
    #[serde(default)]
    pub snippet: String,
}

// =============================================================================
// Reduction
// =============================================================================

fn push_bullet(out: &mut String, content: &str, link: Option<&str>) {
    out.push_str("- ");
    out.push_str(content);
    if let Some(link) = link {
        out.push_str(" (Source: ");
        out.push_str(link);
        out.push(')');
    }
    out.push('\n');
}

/// Flatten a search response into the text handed back to the model.
///
/// Extractive segments win over snippets: a result with any segments never
/// falls back to its snippets, even if every segment is blank.
pub fn flatten_results(response: &SearchResponse) -> String {
    if response.results.is_empty() {
        return NO_INFORMATION_FOUND.to_string();
    }

    let mut text = String::new();
    for data in response
        .results
        .iter()
        .filter_map(|r| r.document.as_ref())
        .filter_map(|d| d.derived_struct_data.as_ref())
    {
        let link = data.link.as_deref().filter(|l| !l.is_empty());

        if !data.extractive_segments.is_empty() {
            for segment in &data.extractive_segments {
                let content = segment.content.trim();
                if !content.is_empty() {
                    push_bullet(&mut text, content, link);
                }
            }
        } else {
            for snippet in &data.snippets {
                let content = snippet.snippet.trim();
                if !content.is_empty() && content != EMPTY_SNIPPET_PLACEHOLDER {
                    push_bullet(&mut text, content, link);
                }
            }
        }
    }

    if text.is_empty() {
        NO_ANSWER_FOUND.to_string()
    } else {
        text
    }
}

// =============================================================================
// Backend + tool
// =============================================================================

/// Remote search service.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ToolError>;
}

/// Searches the Ministry of Aliyah knowledge base.
pub struct SearchTool {
    backend: Arc<dyn SearchBackend>,
    schema: ToolSchema,
    page_size: u32,
    max_segments: u32,
}

impl SearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            schema: ToolSchema {
                name: SEARCH_TOOL_NAME,
                description: "Searches the ministry of Aliyah's knowledge base (Data Store) for \
                    information to aid new immigrants to Israel in navigating bureaucracy. \
                    Use this for any informational questions.",
                params: vec![ParamSpec::required(
                    "query",
                    ParamKind::String,
                    "The search query (e.g., \"How do I sign up for health insurance?\", \
                     \"How do I get a passport?\").",
                )],
            },
            page_size: 10,
            max_segments: 1,
        }
    }

    pub fn with_limits(mut self, page_size: u32, max_segments: u32) -> Self {
        self.page_size = page_size.min(10);
        self.max_segments = max_segments;
        self
    }

    /// Run one search. Backend failures come back as error-prefixed text.
    pub async fn search(&self, query: &str) -> String {
        let request = SearchRequest::new(query, self.page_size, self.max_segments);
        match self.backend.search(&request).await {
            Ok(response) => {
                debug!(
                    query = %query,
                    documents = response.results.len(),
                    "Knowledge base search complete"
                );
                flatten_results(&response)
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Knowledge base search failed");
                format!("{}{}", SEARCH_ERROR_PREFIX, e)
            }
        }
    }
}

#[async_trait]
impl ChatTool for SearchTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, args: &Map<String, Value>) -> ToolResult {
        let query = args.get("query").and_then(Value::as_str).unwrap_or_default();
        ToolResult::Text(self.search(query).await)
    }
}
