//! Branch directory lookup tool.
//!
//! Pass-through executor: the model writes the query from the table schema
//! embedded in its instructions, and this tool runs it verbatim.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use oleh_core::Row;
use oleh_storage::SqliteRecordStore;

use crate::error::ToolError;
use crate::registry::ChatTool;
use crate::result::ToolResult;
use crate::schema::{ParamKind, ParamSpec, ToolSchema};

pub const BRANCH_TOOL_NAME: &str = "find_ministry_of_aliyah_branch";

/// Structured store that executes backend-native queries.
pub trait RecordStore: Send + Sync {
    fn query(&self, sql: &str) -> Result<Vec<Row>, ToolError>;
}

impl RecordStore for SqliteRecordStore {
    fn query(&self, sql: &str) -> Result<Vec<Row>, ToolError> {
        SqliteRecordStore::query(self, sql).map_err(|e| ToolError::Store(e.to_string()))
    }
}

pub struct RecordLookupTool {
    store: Arc<dyn RecordStore>,
    schema: ToolSchema,
}

impl RecordLookupTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            schema: ToolSchema {
                name: BRANCH_TOOL_NAME,
                description: "Executes a SQL query against the branch directory and returns \
                    the results as a list of rows.",
                params: vec![ParamSpec::required(
                    "query",
                    ParamKind::String,
                    "The SQL query string to execute.",
                )],
            },
        }
    }

    /// Run `sql` and return every row, or a single error row on failure.
    pub fn lookup(&self, sql: &str) -> ToolResult {
        match self.store.query(sql) {
            Ok(rows) => {
                debug!(rows = rows.len(), "Branch lookup complete");
                ToolResult::Rows(rows)
            }
            Err(e) => {
                warn!(error = %e, "Branch lookup failed");
                ToolResult::error(e.to_string())
            }
        }
    }
}

#[async_trait]
impl ChatTool for RecordLookupTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn call(&self, args: &Map<String, Value>) -> ToolResult {
        let sql = args.get("query").and_then(Value::as_str).unwrap_or_default();
        self.lookup(sql)
    }
}
