//! Tools the model can call, keyed by name.
//!
//! `dispatch` looks the requested name up, checks the arguments against the
//! tool's schema, and runs it. Every outcome, including an unknown name, is
//! a `ToolResult` the loop can hand back to the model.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use oleh_core::ToolRequest;

use crate::records::RecordLookupTool;
use crate::result::ToolResult;
use crate::schema::ToolSchema;
use crate::search::SearchTool;

/// Result fed back to the model when it asks for a tool that does not exist.
pub const UNKNOWN_TOOL: &str = "Unknown tool.";

/// A capability the model may invoke.
///
/// `call` receives arguments already validated against `schema()` and must
/// not fail: backend problems are reported through the returned result.
#[async_trait]
pub trait ChatTool: Send + Sync {
    fn schema(&self) -> &ToolSchema;

    async fn call(&self, args: &Map<String, Value>) -> ToolResult;

    fn name(&self) -> &'static str {
        self.schema().name
    }
}

/// Function declaration handed to the model at session creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Name-keyed set of tools.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ChatTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the two assistant tools.
    pub fn standard(search: SearchTool, records: RecordLookupTool) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(search));
        registry.register(Arc::new(records));
        registry
    }

    /// Add a tool, replacing any tool registered under the same name.
    pub fn register(&mut self, tool: Arc<dyn ChatTool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ChatTool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools
            .iter()
            .map(|t| {
                let schema = t.schema();
                ToolDeclaration {
                    name: schema.name.to_string(),
                    description: schema.description.to_string(),
                    parameters: schema.parameters_json(),
                }
            })
            .collect()
    }

    /// Resolve and run one tool request.
    ///
    /// Unknown names resolve to the `UNKNOWN_TOOL` text and invalid
    /// arguments to an error sentinel, so a bad request never fails the turn.
    pub async fn dispatch(&self, request: &ToolRequest) -> ToolResult {
        let Some(tool) = self.get(&request.tool_name) else {
            warn!(tool = %request.tool_name, "Model requested an unknown tool");
            return ToolResult::Text(UNKNOWN_TOOL.to_string());
        };

        if let Err(e) = tool.schema().validate(&request.arguments) {
            warn!(tool = %request.tool_name, error = %e, "Rejected tool arguments");
            return ToolResult::error(e.to_string());
        }

        let started = Instant::now();
        let result = tool.call(&request.arguments).await;
        info!(
            tool = %request.tool_name,
            kind = result.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool call finished"
        );
        result
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}
