//! Tools the assistant can call while answering a turn.
//!
//! Defines the `ChatTool` async trait, the registry that validates and
//! dispatches model tool requests, and the two concrete tools: knowledge-base
//! search and Ministry of Aliyah branch lookup.

pub mod discovery;
pub mod error;
pub mod records;
pub mod registry;
pub mod result;
pub mod schema;
pub mod search;

pub use discovery::DiscoveryEngineBackend;
pub use error::ToolError;
pub use records::{RecordLookupTool, RecordStore, BRANCH_TOOL_NAME};
pub use registry::{ChatTool, ToolDeclaration, ToolRegistry, UNKNOWN_TOOL};
pub use result::ToolResult;
pub use schema::{ParamKind, ParamSpec, ToolSchema};
pub use search::{
    flatten_results, SearchBackend, SearchRequest, SearchResponse, SearchTool,
    NO_ANSWER_FOUND, NO_INFORMATION_FOUND, SEARCH_ERROR_PREFIX, SEARCH_TOOL_NAME,
};
