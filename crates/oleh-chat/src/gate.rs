//! Upload gate.
//!
//! Runs before the orchestration loop on every turn. The literal command
//! `upload` turns a staged attachment into a multimodal message; without an
//! attachment the turn stops here with a corrective prompt and the model is
//! never contacted. Any other text passes through untouched.

use tracing::debug;

use oleh_core::{Part, TurnInput};

/// Command word that submits the staged attachment.
pub const UPLOAD_COMMAND: &str = "upload";

/// Text sent to the model alongside an uploaded document.
pub const UPLOAD_INSTRUCTION: &str = "Please explain this document for me.";

/// Warning shown when `upload` is typed with nothing attached.
pub const NO_FILE_ATTACHED: &str =
    "📁 No file attached. Please attach a file using the chat input, then type 'upload' again.";

/// What the gate decided for one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Send these parts to the model.
    Send(Vec<Part>),
    /// End the turn with this assistant message.
    ShortCircuit(String),
}

pub struct UploadGate;

impl UploadGate {
    pub fn is_upload_command(text: &str) -> bool {
        text.trim().eq_ignore_ascii_case(UPLOAD_COMMAND)
    }

    /// Build the outgoing message parts for a turn.
    ///
    /// Attachments accompanying anything other than the upload command are
    /// not sent.
    pub fn prepare(input: &TurnInput) -> GateOutcome {
        let text = input.text();
        if !Self::is_upload_command(text) {
            return GateOutcome::Send(vec![Part::text(text)]);
        }

        match input.attachment() {
            Some(attachment) => {
                debug!(
                    file = %attachment.file_name,
                    media_type = %attachment.media_type,
                    bytes = attachment.bytes.len(),
                    "Attaching uploaded document"
                );
                GateOutcome::Send(vec![
                    Part::text(UPLOAD_INSTRUCTION),
                    Part::from_attachment(attachment),
                ])
            }
            None => GateOutcome::ShortCircuit(NO_FILE_ATTACHED.to_string()),
        }
    }
}
