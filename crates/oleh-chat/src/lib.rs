//! Conversational core of OlehAssist.
//!
//! Holds the chat model client, per-user conversation sessions, the upload
//! gate, and the orchestration loop that drives model tool calls for one
//! user turn.

pub mod error;
pub mod gate;
pub mod gemini;
pub mod menu;
pub mod oracle;
pub mod orchestrator;
pub mod prompt;
pub mod session;

pub use error::ChatError;
pub use gate::{GateOutcome, UploadGate, NO_FILE_ATTACHED, UPLOAD_COMMAND, UPLOAD_INSTRUCTION};
pub use gemini::GeminiChat;
pub use menu::{normalize_menu, CANONICAL_MENU};
pub use oracle::{ChatOracle, OracleResponse};
pub use orchestrator::{
    TurnOrchestrator, TurnReply, TurnStatus, CAP_WARNING, FALLBACK_REPLY, MAX_TOOL_ITERATIONS,
};
pub use prompt::{build_system_instructions, SCHEMA_UNAVAILABLE};
pub use session::{ConversationSession, OracleFactory, SessionManager, SharedSession};
