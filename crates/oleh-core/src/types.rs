use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// =============================================================================
// Transcript
// =============================================================================

/// Author of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One transcript entry. Immutable once appended to a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One materialized record: column name to scalar value.
pub type Row = Map<String, Value>;

// =============================================================================
// Turn input
// =============================================================================

/// Attachment formats accepted from the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Png,
    Jpeg,
    Pdf,
}

impl MediaType {
    /// MIME type sent to the model alongside the bytes.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Pdf => "application/pdf",
        }
    }

    /// Match a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(MediaType::Png),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(MediaType::Png),
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "application/pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A file the user staged for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

/// One user turn, classified once at the UI boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnInput {
    Text(String),
    TextWithAttachment { text: String, attachment: Attachment },
}

impl TurnInput {
    pub fn text(&self) -> &str {
        match self {
            TurnInput::Text(text) => text,
            TurnInput::TextWithAttachment { text, .. } => text,
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            TurnInput::Text(_) => None,
            TurnInput::TextWithAttachment { attachment, .. } => Some(attachment),
        }
    }
}

// =============================================================================
// Model message parts
// =============================================================================

/// The model's request to invoke a registered tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// One part of a message exchanged with the model.
#[derive(Clone, Debug, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
    FunctionCall(ToolRequest),
    FunctionResponse { name: String, response: Value },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn from_attachment(attachment: &Attachment) -> Self {
        Part::InlineData {
            mime_type: attachment.media_type.mime().to_string(),
            data: attachment.bytes.clone(),
        }
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        match self {
            Part::FunctionCall(request) => Some(request),
            _ => None,
        }
    }
}
