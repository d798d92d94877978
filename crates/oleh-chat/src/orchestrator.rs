//! Turn orchestrator: drives one user turn through the model and its tools.
//!
//! The loop sends the prepared message, executes the first tool call in each
//! reply, returns the result to the model, and repeats until the model
//! answers in plain text or `MAX_TOOL_ITERATIONS` round trips have been made.

use std::sync::Arc;

use tracing::{error, info, warn};

use oleh_core::config::ChatConfig;
use oleh_core::{Part, TurnInput};
use oleh_tools::ToolRegistry;

use crate::error::ChatError;
use crate::gate::{GateOutcome, UploadGate};
use crate::menu::normalize_menu;
use crate::oracle::ChatOracle;
use crate::session::ConversationSession;

/// Tool round trips allowed per turn.
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// Reply used when the model produced no text.
pub const FALLBACK_REPLY: &str = "I'm sorry, I didn't catch that. Could you please repeat?";

/// Shown alongside a reply cut short by the iteration cap.
pub const CAP_WARNING: &str = "⚠️ Maximum tool iterations reached.";

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The model answered within the iteration cap.
    Answered,
    /// The iteration cap was reached; the last reply was used as-is.
    Capped,
    /// The upload gate ended the turn without contacting the model.
    ShortCircuited,
    /// The model call failed; the reply is the error message.
    Failed,
    /// The input was refused before the gate.
    Rejected,
}

/// Result of one turn. `text` is what was appended to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub text: String,
    pub status: TurnStatus,
    pub tool_round_trips: usize,
}

impl TurnReply {
    fn new(text: String, status: TurnStatus, tool_round_trips: usize) -> Self {
        Self {
            text,
            status,
            tool_round_trips,
        }
    }

    /// Warning to surface next to the reply, if any.
    pub fn warning(&self) -> Option<&'static str> {
        match self.status {
            TurnStatus::Capped => Some(CAP_WARNING),
            _ => None,
        }
    }
}

/// Runs turns against a shared tool registry.
pub struct TurnOrchestrator {
    registry: Arc<ToolRegistry>,
    config: ChatConfig,
}

impl TurnOrchestrator {
    pub fn new(registry: Arc<ToolRegistry>, config: ChatConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn validate(&self, input: &TurnInput) -> Result<(), ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        let text = input.text();
        if text.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }
        Ok(())
    }

    /// Run one user turn and append exactly one assistant message.
    ///
    /// The caller records the user's message first with
    /// `ConversationSession::record_user`. Model failures are rendered into
    /// the reply; the session stays usable for the next turn.
    pub async fn run_turn(&self, session: &mut ConversationSession, input: TurnInput) -> TurnReply {
        let session_id = session.id();

        if let Err(e) = self.validate(&input) {
            warn!(session_id = %session_id, error = %e, "Turn rejected");
            let text = format!("⚠️ {}", e);
            session.record_assistant(text.clone());
            return TurnReply::new(text, TurnStatus::Rejected, 0);
        }

        let parts = match UploadGate::prepare(&input) {
            GateOutcome::Send(parts) => parts,
            GateOutcome::ShortCircuit(warning) => {
                info!(session_id = %session_id, "Upload requested without an attachment");
                session.record_assistant(warning.clone());
                return TurnReply::new(warning, TurnStatus::ShortCircuited, 0);
            }
        };

        let outcome = match session.oracle_mut() {
            Ok(oracle) => self.converse(&mut **oracle, parts).await,
            Err(e) => {
                warn!(session_id = %session_id, "Turn on an ended session");
                return TurnReply::new(e.to_string(), TurnStatus::Rejected, 0);
            }
        };

        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Turn failed");
                TurnReply::new(format!("❌ Error: {}", e), TurnStatus::Failed, 0)
            }
        };

        info!(
            session_id = %session_id,
            status = ?reply.status,
            tool_round_trips = reply.tool_round_trips,
            "Turn complete"
        );
        session.record_assistant(reply.text.clone());
        reply
    }

    async fn converse(
        &self,
        oracle: &mut dyn ChatOracle,
        parts: Vec<Part>,
    ) -> Result<TurnReply, ChatError> {
        let mut response = oracle.send(parts).await?;
        let mut iteration = 0;

        while iteration < MAX_TOOL_ITERATIONS {
            let Some(request) = response.first_tool_request().cloned() else {
                break;
            };

            info!(tool = %request.tool_name, iteration, "Model requested a tool");
            let result = self.registry.dispatch(&request).await;
            response = oracle
                .send(vec![Part::FunctionResponse {
                    name: request.tool_name,
                    response: result.to_payload(),
                }])
                .await?;
            iteration += 1;
        }

        let status = if iteration >= MAX_TOOL_ITERATIONS {
            warn!(iterations = iteration, "Maximum tool iterations reached");
            TurnStatus::Capped
        } else {
            TurnStatus::Answered
        };

        let text = response
            .text()
            .filter(|t| !t.is_empty())
            .map(normalize_menu)
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());

        Ok(TurnReply::new(text, status, iteration))
    }
}
