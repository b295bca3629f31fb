//! Analysis session state machine.
//!
//! One session spans first submission to reset: Idle → Submitting →
//! Ready or Failed. Phase data lives inside the state enum, so the
//! invariants hold structurally — a result exists only in Ready, an error
//! message only in Failed, and the conversation thread only inside Ready
//! (it is created empty on entry and destroyed on reset).
//!
//! Submission is split-phase: `begin_submission` captures the payload,
//! the provider, and a fresh ticket; `complete_submission` applies the
//! outcome only if that ticket is still current. A reset while a request
//! is in flight abandons it — the late completion is discarded rather
//! than applied to the new session state.

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::client::{AnalysisApi, AnalyzedReport, ChatPrompt, ClientError, Provider};
use crate::conversation::{ConversationThread, ThreadError};
use crate::input::Submission;
use crate::models::ReportSummary;

/// Error-panel message when the service declined without saying why, or
/// the response was unusable.
pub const ANALYSIS_FAILED_FALLBACK: &str = "Analysis failed. Please try again.";

/// Error-panel message when the service could not be reached at all.
/// Deliberately distinct from the service-failure fallback so the user
/// can tell "the service declined" from "nothing answered".
pub const CONNECTIVITY_FALLBACK: &str =
    "Could not connect to the analysis service. Please make sure the backend is running.";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Observable phase of the session. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    Ready,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("an analysis request is already in flight")]
    SubmissionInFlight,
    #[error("a report is already loaded; start a new report first")]
    AlreadyAnalyzed,
    #[error("dismiss the current error before submitting again")]
    ErrorNotDismissed,
    #[error("no analyzed report to discuss")]
    NoActiveReport,
    #[error(transparent)]
    Thread(#[from] ThreadError),
}

/// An accepted submission: the payload to send, the provider captured by
/// value at submission time, and the ticket identifying this attempt.
#[derive(Debug, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub ticket: Uuid,
    pub payload: Submission,
    pub provider: Provider,
}

/// An accepted follow-up question: the full chat prompt plus the ticket
/// identifying this turn.
#[derive(Debug)]
pub struct PendingQuestion {
    pub ticket: Uuid,
    pub prompt: ChatPrompt,
}

enum SessionState {
    Idle,
    Submitting {
        ticket: Uuid,
    },
    Ready {
        analysis: ReportSummary,
        report_text: String,
        analyzed_at: NaiveDateTime,
        thread: ConversationThread,
    },
    Failed {
        message: String,
    },
}

// ═══════════════════════════════════════════════════════════
// AnalysisSession
// ═══════════════════════════════════════════════════════════

/// The session state machine. Created fresh per run; never persisted.
pub struct AnalysisSession {
    state: SessionState,
    provider: Provider,
}

impl AnalysisSession {
    pub fn new(provider: Provider) -> Self {
        Self {
            state: SessionState::Idle,
            provider,
        }
    }

    // ── Observers ───────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        match self.state {
            SessionState::Idle => Phase::Idle,
            SessionState::Submitting { .. } => Phase::Submitting,
            SessionState::Ready { .. } => Phase::Ready,
            SessionState::Failed { .. } => Phase::Failed,
        }
    }

    /// The last successful result. Present iff the phase is Ready.
    pub fn result(&self) -> Option<&ReportSummary> {
        match &self.state {
            SessionState::Ready { analysis, .. } => Some(analysis),
            _ => None,
        }
    }

    /// The canonical text the service analyzed. Present iff Ready.
    pub fn report_text(&self) -> Option<&str> {
        match &self.state {
            SessionState::Ready { report_text, .. } => Some(report_text),
            _ => None,
        }
    }

    pub fn analyzed_at(&self) -> Option<NaiveDateTime> {
        match &self.state {
            SessionState::Ready { analyzed_at, .. } => Some(*analyzed_at),
            _ => None,
        }
    }

    /// The user-facing error. Present iff the phase is Failed.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// The conversation thread, present only while Ready.
    pub fn thread(&self) -> Option<&ConversationThread> {
        match &self.state {
            SessionState::Ready { thread, .. } => Some(thread),
            _ => None,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    // ── Actions ─────────────────────────────────────────────

    /// Change the provider for future submissions. Allowed in any phase;
    /// an in-flight request keeps the provider captured when it began.
    pub fn set_provider(&mut self, provider: Provider) {
        self.provider = provider;
    }

    /// Accept a submission and enter Submitting.
    ///
    /// Only one analysis request may be in flight, and a loaded result or
    /// an undismissed error must be cleared before the next submission.
    pub fn begin_submission(
        &mut self,
        payload: Submission,
    ) -> Result<AnalysisRequest, SessionError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Submitting { .. } => return Err(SessionError::SubmissionInFlight),
            SessionState::Ready { .. } => return Err(SessionError::AlreadyAnalyzed),
            SessionState::Failed { .. } => return Err(SessionError::ErrorNotDismissed),
        }

        let ticket = Uuid::new_v4();
        let provider = self.provider;
        tracing::info!(%ticket, %provider, "analysis submission started");
        self.state = SessionState::Submitting { ticket };
        Ok(AnalysisRequest {
            ticket,
            payload,
            provider,
        })
    }

    /// Apply a submission outcome. Outcomes whose ticket is no longer
    /// current (the session was reset meanwhile) are discarded.
    pub fn complete_submission(
        &mut self,
        ticket: Uuid,
        outcome: Result<AnalyzedReport, ClientError>,
    ) {
        match &self.state {
            SessionState::Submitting { ticket: current } if *current == ticket => {}
            _ => {
                tracing::debug!(%ticket, "discarding stale analysis response");
                return;
            }
        }

        self.state = match outcome {
            Ok(report) => {
                tracing::info!(
                    findings = report.analysis.findings.len(),
                    "analysis succeeded"
                );
                SessionState::Ready {
                    analysis: report.analysis,
                    report_text: report.report_text,
                    analyzed_at: Local::now().naive_local(),
                    thread: ConversationThread::new(),
                }
            }
            Err(ClientError::NetworkUnreachable(detail)) => {
                tracing::warn!(%detail, "analysis transport failure");
                SessionState::Failed {
                    message: CONNECTIVITY_FALLBACK.to_string(),
                }
            }
            Err(ClientError::ServiceRejected { reason }) => {
                let message = reason.unwrap_or_else(|| ANALYSIS_FAILED_FALLBACK.to_string());
                tracing::warn!(%message, "analysis rejected by service");
                SessionState::Failed { message }
            }
            Err(ClientError::MalformedResponse(detail)) => {
                tracing::warn!(%detail, "malformed analysis response");
                SessionState::Failed {
                    message: ANALYSIS_FAILED_FALLBACK.to_string(),
                }
            }
        };
    }

    /// Clear a Failed state back to Idle. No-op in any other phase —
    /// errors are terminal for that submission, not resumable.
    pub fn dismiss_error(&mut self) {
        if let SessionState::Failed { .. } = self.state {
            self.state = SessionState::Idle;
        }
    }

    /// Discard the session: result, report text, and thread all go, and
    /// any in-flight request becomes stale.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    // ── Follow-up questions ─────────────────────────────────

    /// Accept a follow-up question against the Ready result. The prompt
    /// captures the report text, the summary, the history, and the
    /// current provider by value.
    pub fn begin_question(&mut self, question: &str) -> Result<PendingQuestion, SessionError> {
        let provider = self.provider;
        let SessionState::Ready {
            analysis,
            report_text,
            thread,
            ..
        } = &mut self.state
        else {
            return Err(SessionError::NoActiveReport);
        };

        let turn = thread.begin_question(question)?;
        Ok(PendingQuestion {
            ticket: turn.ticket,
            prompt: ChatPrompt {
                report_text: report_text.clone(),
                analysis_summary: analysis.summary.clone(),
                question: turn.question,
                history: turn.history,
                provider,
            },
        })
    }

    /// Apply a question outcome. If the session has left Ready since the
    /// question was issued, the outcome is discarded with the thread.
    pub fn complete_question(&mut self, ticket: Uuid, outcome: Result<String, ClientError>) {
        match &mut self.state {
            SessionState::Ready { thread, .. } => thread.complete_question(ticket, outcome),
            _ => tracing::debug!(%ticket, "discarding chat response for abandoned session"),
        }
    }

    // ── Async drivers ───────────────────────────────────────

    /// Run one submission end to end against the given API.
    ///
    /// `Ok` means the submission was accepted and resolved — the session
    /// ends in Ready or Failed, never stuck in Submitting.
    pub async fn submit_with<A: AnalysisApi + ?Sized>(
        &mut self,
        api: &A,
        payload: Submission,
    ) -> Result<(), SessionError> {
        let request = self.begin_submission(payload)?;
        let outcome = match &request.payload {
            Submission::Document { name, bytes } => {
                api.analyze_document(name, bytes.clone(), request.provider).await
            }
            Submission::Text(text) => api.analyze_text(text, request.provider).await,
        };
        self.complete_submission(request.ticket, outcome);
        Ok(())
    }

    /// Run one follow-up question end to end against the given API.
    ///
    /// `Ok` means the turn ran; a failed answer shows up as an inline
    /// assistant fallback message, not as an error here.
    pub async fn ask_with<A: AnalysisApi + ?Sized>(
        &mut self,
        api: &A,
        question: &str,
    ) -> Result<(), SessionError> {
        let pending = self.begin_question(question)?;
        let outcome = api.chat(&pending.prompt).await;
        self.complete_question(pending.ticket, outcome);
        Ok(())
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(Provider::default())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
