//! Conversation sessions.
//!
//! A session owns the user-visible transcript and the live chat handle for
//! one user. Sessions are created lazily on the first turn, persist across
//! turns, and are torn down explicitly with `end`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use oleh_core::Message;

use crate::error::ChatError;
use crate::oracle::ChatOracle;

/// Transcript plus chat handle for one user.
pub struct ConversationSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    transcript: Vec<Message>,
    oracle: Option<Box<dyn ChatOracle>>,
}

impl ConversationSession {
    /// Start a session whose transcript opens with `greeting`.
    ///
    /// The greeting is shown to the user only; the model never sees it.
    pub fn new(oracle: Box<dyn ChatOracle>, greeting: &str) -> Self {
        Self::with_id(Uuid::new_v4(), oracle, greeting)
    }

    pub fn with_id(id: Uuid, oracle: Box<dyn ChatOracle>, greeting: &str) -> Self {
        let mut transcript = Vec::new();
        if !greeting.is_empty() {
            transcript.push(Message::assistant(greeting));
        }
        Self {
            id,
            started_at: Utc::now(),
            transcript,
            oracle: Some(oracle),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Messages in the order they were appended.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Record the user's utterance before the turn runs.
    pub fn record_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::user(content))
    }

    pub(crate) fn record_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::assistant(content))
    }

    fn push(&mut self, message: Message) -> &Message {
        self.transcript.push(message);
        &self.transcript[self.transcript.len() - 1]
    }

    pub(crate) fn oracle_mut(&mut self) -> Result<&mut Box<dyn ChatOracle>, ChatError> {
        let id = self.id;
        self.oracle.as_mut().ok_or(ChatError::SessionEnded(id))
    }

    pub fn is_ended(&self) -> bool {
        self.oracle.is_none()
    }

    /// Tear the session down, discarding the transcript and the chat handle.
    pub fn end(&mut self) {
        if self.oracle.take().is_some() {
            info!(
                session_id = %self.id,
                messages = self.transcript.len(),
                "Conversation session ended"
            );
        }
        self.transcript.clear();
    }
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("messages", &self.transcript.len())
            .field("ended", &self.is_ended())
            .finish()
    }
}

/// Builds the chat handle for a new session.
pub type OracleFactory = Box<dyn Fn() -> Box<dyn ChatOracle> + Send + Sync>;

/// Session shared between the registry and the turn that is using it.
///
/// The async mutex serializes turns: at most one turn runs per session.
pub type SharedSession = Arc<tokio::sync::Mutex<ConversationSession>>;

/// Registry of live sessions keyed by id.
pub struct SessionManager {
    sessions: Mutex<HashMap<Uuid, SharedSession>>,
    factory: OracleFactory,
    greeting: String,
}

impl SessionManager {
    pub fn new(factory: OracleFactory, greeting: impl Into<String>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            factory,
            greeting: greeting.into(),
        }
    }

    /// Return the session for `id`, creating it on first use.
    pub fn get_or_create(&self, id: Uuid) -> Result<SharedSession, ChatError> {
        let mut sessions = self.sessions.lock().map_err(|_| ChatError::LockPoisoned)?;
        let session = sessions.entry(id).or_insert_with(|| {
            info!(session_id = %id, "Conversation session created");
            Arc::new(tokio::sync::Mutex::new(ConversationSession::with_id(
                id,
                (self.factory)(),
                &self.greeting,
            )))
        });
        Ok(Arc::clone(session))
    }

    pub fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(&id).cloned())
    }

    /// Remove and tear down a session. Waits for an in-flight turn to finish.
    pub async fn end(&self, id: Uuid) -> Result<(), ChatError> {
        let session = self
            .sessions
            .lock()
            .map_err(|_| ChatError::LockPoisoned)?
            .remove(&id)
            .ok_or(ChatError::SessionNotFound(id))?;
        session.lock().await.end();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
