//! Per-tool parameter contracts.
//!
//! Model-supplied arguments are checked against the declared parameters
//! before a tool is invoked: required parameters must be present, types must
//! match, and undeclared parameters are rejected.

use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
}

impl ParamKind {
    fn type_name(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }
}

/// Name, description, and parameter list of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolSchema {
    /// Check `args` against the declared parameters.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<(), ToolError> {
        for spec in &self.params {
            match args.get(spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(ToolError::InvalidArguments(format!(
                        "missing required parameter '{}'",
                        spec.name
                    )));
                }
                Some(value) if !value.is_null() && !spec.kind.accepts(value) => {
                    return Err(ToolError::InvalidArguments(format!(
                        "parameter '{}' must be a {}",
                        spec.name,
                        spec.kind.type_name()
                    )));
                }
                _ => {}
            }
        }

        if let Some(unknown) = args
            .keys()
            .find(|key| !self.params.iter().any(|p| p.name == key.as_str()))
        {
            return Err(ToolError::InvalidArguments(format!(
                "unexpected parameter '{}'",
                unknown
            )));
        }

        Ok(())
    }

    /// JSON-schema object describing the parameters, as the model expects it.
    pub fn parameters_json(&self) -> Value {
        let mut properties = Map::new();
        for spec in &self.params {
            properties.insert(
                spec.name.to_string(),
                json!({ "type": spec.kind.type_name(), "description": spec.description }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
