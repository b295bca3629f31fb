//! Follow-up conversation thread for an analyzed report.
//!
//! A thread exists only while its session holds a result, and dies with
//! it. The message log is append-only and chat turns are strictly
//! serialized: `begin_question` refuses a new question while one is
//! pending, so the history sent with question n+1 always reflects exactly
//! the messages visible before it was issued.
//!
//! Failures never stall the thread. Both failure kinds are rendered as
//! assistant messages inline, and `pending` clears on every exit path, so
//! one failed question never blocks the next.

use thiserror::Error;
use uuid::Uuid;

use crate::client::ClientError;
use crate::models::{ChatMessage, ChatRole};

/// Assistant message appended when the service declined or returned an
/// unusable answer.
pub const CHAT_ERROR_FALLBACK: &str = "Sorry, I encountered an error. Please try again.";

/// Assistant message appended when the service could not be reached.
pub const CHAT_OFFLINE_FALLBACK: &str =
    "Sorry, I couldn't connect to the AI service. Please make sure the backend is running.";

/// Starter questions shown while the thread is empty.
pub fn starter_questions() -> Vec<&'static str> {
    vec![
        "What does this mean for my health?",
        "Should I be worried about any results?",
        "What lifestyle changes might help?",
        "What should I ask my doctor about?",
    ]
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThreadError {
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("an answer is still pending")]
    AnswerPending,
}

/// Snapshot handed to the caller when a question is accepted: what to ask
/// and the exact history to send, tagged with the turn's ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub ticket: Uuid,
    pub question: String,
    /// All messages prior to the current question (the just-appended user
    /// message is excluded — the question travels as a separate field).
    pub history: Vec<ChatMessage>,
}

/// Append-only message log with at most one chat request in flight.
#[derive(Debug, Default)]
pub struct ConversationThread {
    messages: Vec<ChatMessage>,
    pending: Option<Uuid>,
}

impl ConversationThread {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept a question: append the user message synchronously, mark the
    /// turn pending, and return the snapshot to send.
    ///
    /// Rejected when the trimmed question is empty or another turn is
    /// still pending.
    pub fn begin_question(&mut self, question: &str) -> Result<ChatTurn, ThreadError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ThreadError::EmptyQuestion);
        }
        if self.pending.is_some() {
            return Err(ThreadError::AnswerPending);
        }

        // History snapshot is taken before the user message is appended.
        let history = self.messages.clone();
        self.messages.push(ChatMessage::user(question));

        let ticket = Uuid::new_v4();
        self.pending = Some(ticket);
        Ok(ChatTurn {
            ticket,
            question: question.to_string(),
            history,
        })
    }

    /// Apply a turn's outcome. Stale tickets (a turn the thread no longer
    /// owns) are discarded without touching the log.
    pub fn complete_question(&mut self, ticket: Uuid, outcome: Result<String, ClientError>) {
        if self.pending != Some(ticket) {
            tracing::debug!(%ticket, "discarding stale chat response");
            return;
        }
        self.pending = None;

        let content = match outcome {
            Ok(answer) => answer,
            Err(ClientError::NetworkUnreachable(detail)) => {
                tracing::warn!(%detail, "chat transport failure");
                CHAT_OFFLINE_FALLBACK.to_string()
            }
            Err(ClientError::MalformedResponse(detail)) => {
                tracing::warn!(%detail, "malformed chat response");
                CHAT_ERROR_FALLBACK.to_string()
            }
            Err(e @ ClientError::ServiceRejected { .. }) => {
                tracing::warn!(error = %e, "chat request rejected");
                CHAT_ERROR_FALLBACK.to_string()
            }
        };
        self.messages.push(ChatMessage::assistant(content));
    }
}

/// Role-aware count helpers used by display code.
impl ConversationThread {
    pub fn user_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .count()
    }
}
