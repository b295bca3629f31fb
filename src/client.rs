//! HTTP client for the remote report-analysis service.
//!
//! `AnalysisApi` is the seam the session and conversation state machines
//! depend on. `AnalysisClient` is the reqwest implementation against the
//! real service; `MockAnalysisApi` is a scripted double for tests.
//!
//! The client is stateless: `provider` is a per-request parameter, never
//! client state, and no operation retries. Every failure is surfaced to
//! the caller as a `ClientError`.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::models::{ChatMessage, ReportSummary};

// ═══════════════════════════════════════════════════════════
// Provider
// ═══════════════════════════════════════════════════════════

/// Which backend model implementation serves a request.
///
/// A request parameter, not client state. Callers capture it by value at
/// request-issue time so a mid-flight change never alters an in-flight
/// request's semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Privacy-first model running on the service host.
    #[default]
    Local,
    /// Hosted cloud model.
    Cloud,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "cloud" => Ok(Self::Cloud),
            other => Err(format!("unknown provider '{other}' (expected local or cloud)")),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Errors and result types
// ═══════════════════════════════════════════════════════════

/// Failure taxonomy for service calls. Surfaced, never swallowed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure — the service could not be reached at all.
    #[error("cannot reach the analysis service: {0}")]
    NetworkUnreachable(String),
    /// The service was reached and declined the request. `reason` carries
    /// the service's human-readable message when it provided one.
    #[error("analysis service rejected the request ({})", .reason.as_deref().unwrap_or("no reason given"))]
    ServiceRejected { reason: Option<String> },
    /// The service responded but the body did not match the expected shape.
    /// Treated like a rejection for user messaging, logged distinctly.
    #[error("unexpected response from the analysis service: {0}")]
    MalformedResponse(String),
}

/// A successful analysis: the structured summary plus the canonical text
/// the service actually analyzed (post-extraction for file uploads).
#[derive(Debug, Clone)]
pub struct AnalyzedReport {
    pub analysis: ReportSummary,
    pub report_text: String,
}

/// Everything a chat request carries, captured by value when the question
/// is issued. `history` holds all messages prior to the current question;
/// the question itself travels as a separate field.
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    pub report_text: String,
    pub analysis_summary: String,
    pub question: String,
    pub history: Vec<ChatMessage>,
    pub provider: Provider,
}

/// Service health as reported by `GET /health`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub ai_model: AiModelStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiModelStatus {
    pub available: bool,
    pub provider: String,
    pub model: String,
}

// ═══════════════════════════════════════════════════════════
// AnalysisApi — the seam the state machines depend on
// ═══════════════════════════════════════════════════════════

#[async_trait]
pub trait AnalysisApi {
    /// Submit document bytes for analysis.
    async fn analyze_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        provider: Provider,
    ) -> Result<AnalyzedReport, ClientError>;

    /// Submit raw report text for analysis.
    async fn analyze_text(
        &self,
        text: &str,
        provider: Provider,
    ) -> Result<AnalyzedReport, ClientError>;

    /// Ask a follow-up question grounded in an analyzed report.
    async fn chat(&self, prompt: &ChatPrompt) -> Result<String, ClientError>;
}

// ═══════════════════════════════════════════════════════════
// Wire shapes
// ═══════════════════════════════════════════════════════════

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextAnalysisRequest<'a> {
    report_text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequestBody<'a> {
    report_text: &'a str,
    analysis_summary: &'a str,
    question: &'a str,
    conversation_history: &'a [ChatMessage],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponseBody {
    #[serde(default)]
    success: bool,
    analysis: Option<ReportSummary>,
    report_text: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    success: bool,
    answer: Option<String>,
    error: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// AnalysisClient — reqwest implementation
// ═══════════════════════════════════════════════════════════

/// HTTP client against the real analysis service.
pub struct AnalysisClient {
    base_url: String,
    http: reqwest::Client,
}

impl AnalysisClient {
    /// Create a client for the given base URL (e.g. `http://localhost:8080/api`).
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Create a client from `LABCLEAR_API_URL`, falling back to the default.
    pub fn from_env() -> Self {
        Self::new(&config::api_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check service and AI model availability.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).send().await.map_err(map_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::ServiceRejected {
                reason: Some(format!("HTTP {}", status.as_u16())),
            });
        }
        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    async fn decode_analysis(
        response: reqwest::Response,
    ) -> Result<AnalyzedReport, ClientError> {
        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;

        // The service returns the structured response shape even on error
        // statuses, so parse first and fall back to the bare status code.
        let parsed: AnalyzeResponseBody = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(ClientError::MalformedResponse(e.to_string()));
            }
            Err(_) => {
                return Err(ClientError::ServiceRejected {
                    reason: Some(format!("HTTP {}", status.as_u16())),
                });
            }
        };

        if !parsed.success {
            return Err(ClientError::ServiceRejected {
                reason: parsed.error,
            });
        }

        let analysis = parsed.analysis.ok_or_else(|| {
            ClientError::MalformedResponse("success response is missing 'analysis'".into())
        })?;
        Ok(AnalyzedReport {
            analysis,
            report_text: parsed.report_text.unwrap_or_default(),
        })
    }
}

/// Map a reqwest transport error to the failure taxonomy. Anything that
/// prevented a response from arriving counts as unreachable.
fn map_transport(e: reqwest::Error) -> ClientError {
    ClientError::NetworkUnreachable(e.to_string())
}

#[async_trait]
impl AnalysisApi for AnalysisClient {
    async fn analyze_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        provider: Provider,
    ) -> Result<AnalyzedReport, ClientError> {
        let url = format!(
            "{}/reports/analyze?provider={}",
            self.base_url,
            provider.as_str()
        );
        tracing::debug!(file_name, %provider, size = bytes.len(), "analyzing document");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport)?;
        Self::decode_analysis(response).await
    }

    async fn analyze_text(
        &self,
        text: &str,
        provider: Provider,
    ) -> Result<AnalyzedReport, ClientError> {
        let url = format!(
            "{}/reports/analyze/text?provider={}",
            self.base_url,
            provider.as_str()
        );
        tracing::debug!(%provider, chars = text.len(), "analyzing text");

        let response = self
            .http
            .post(&url)
            .json(&TextAnalysisRequest { report_text: text })
            .send()
            .await
            .map_err(map_transport)?;
        Self::decode_analysis(response).await
    }

    async fn chat(&self, prompt: &ChatPrompt) -> Result<String, ClientError> {
        let url = format!(
            "{}/reports/chat?provider={}",
            self.base_url,
            prompt.provider.as_str()
        );
        tracing::debug!(
            provider = %prompt.provider,
            history_len = prompt.history.len(),
            "sending follow-up question"
        );

        let body = ChatRequestBody {
            report_text: &prompt.report_text,
            analysis_summary: &prompt.analysis_summary,
            question: &prompt.question,
            conversation_history: &prompt.history,
        };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport)?;
        let parsed: ChatResponseBody = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(ClientError::MalformedResponse(e.to_string()));
            }
            Err(_) => {
                return Err(ClientError::ServiceRejected {
                    reason: Some(format!("HTTP {}", status.as_u16())),
                });
            }
        };

        if !parsed.success {
            return Err(ClientError::ServiceRejected {
                reason: parsed.error,
            });
        }
        parsed.answer.ok_or_else(|| {
            ClientError::MalformedResponse("success response is missing 'answer'".into())
        })
    }
}

// ═══════════════════════════════════════════════════════════
// MockAnalysisApi — scripted double for tests
// ═══════════════════════════════════════════════════════════

/// Scripted analysis API for testing the state machines without a network.
///
/// Queue outcomes with `push_analysis` / `push_chat`; each call pops the
/// next scripted outcome. Chat prompts are recorded so tests can assert
/// exactly what history was sent.
#[derive(Default)]
pub struct MockAnalysisApi {
    analysis_outcomes: Mutex<VecDeque<Result<AnalyzedReport, ClientError>>>,
    chat_outcomes: Mutex<VecDeque<Result<String, ClientError>>>,
    chat_prompts: Mutex<Vec<ChatPrompt>>,
}

impl MockAnalysisApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_analysis(&self, outcome: Result<AnalyzedReport, ClientError>) {
        self.analysis_outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn push_chat(&self, outcome: Result<String, ClientError>) {
        self.chat_outcomes.lock().unwrap().push_back(outcome);
    }

    /// All chat prompts received so far, in call order.
    pub fn chat_prompts(&self) -> Vec<ChatPrompt> {
        self.chat_prompts.lock().unwrap().clone()
    }

    fn exhausted() -> ClientError {
        ClientError::ServiceRejected {
            reason: Some("mock has no scripted outcome".into()),
        }
    }
}

#[async_trait]
impl AnalysisApi for MockAnalysisApi {
    async fn analyze_document(
        &self,
        _file_name: &str,
        _bytes: Vec<u8>,
        _provider: Provider,
    ) -> Result<AnalyzedReport, ClientError> {
        self.analysis_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }

    async fn analyze_text(
        &self,
        _text: &str,
        _provider: Provider,
    ) -> Result<AnalyzedReport, ClientError> {
        self.analysis_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }

    async fn chat(&self, prompt: &ChatPrompt) -> Result<String, ClientError> {
        self.chat_prompts.lock().unwrap().push(prompt.clone());
        self.chat_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }
}
