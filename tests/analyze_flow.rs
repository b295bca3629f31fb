//! End-to-end flow tests: the real `AnalysisClient` against a stub
//! analysis service bound to an ephemeral port.

use axum::extract::{Multipart, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use labclear::client::{AnalysisApi, AnalysisClient, ClientError, Provider};
use labclear::input::Submission;
use labclear::session::{AnalysisSession, Phase, CONNECTIVITY_FALLBACK};

const REPORT_TEXT: &str = "WBC: 7.2 (ref 4.5-11.0), all normal.";

fn success_analysis_body(report_text: &str) -> Value {
    json!({
        "success": true,
        "analysis": {
            "summary": "All values look normal.",
            "findings": [{
                "testName": "WBC",
                "value": "7.2",
                "referenceRange": "4.5-11.0",
                "status": "NORMAL",
                "explanation": "Within the expected range."
            }],
            "glossary": [{"term": "WBC", "definition": "White blood cells."}],
            "discussionQuestions": [{
                "question": "Should I repeat this test?",
                "context": "Routine follow-up."
            }],
            "disclaimer": "Not medical advice."
        },
        "reportText": report_text
    })
}

/// Stub service mirroring the real backend's routes and response shapes.
fn stub_service() -> Router {
    Router::new()
        .route(
            "/api/reports/analyze",
            post(|mut multipart: Multipart| async move {
                let mut bytes = Vec::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    if field.name() == Some("file") {
                        bytes = field.bytes().await.unwrap().to_vec();
                    }
                }
                if bytes.is_empty() {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"success": false, "error": "File is empty"})),
                    );
                }
                let text = String::from_utf8_lossy(&bytes).into_owned();
                (StatusCode::OK, Json(success_analysis_body(&text)))
            }),
        )
        .route(
            "/api/reports/analyze/text",
            post(|Json(body): Json<Value>| async move {
                let text = body["reportText"].as_str().unwrap_or_default().to_string();
                if text.contains("unparseable") {
                    // The backend sends the structured error shape with a
                    // 4xx status, and the client must still surface it.
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"success": false, "error": "Could not parse report"})),
                    );
                }
                (StatusCode::OK, Json(success_analysis_body(&text)))
            }),
        )
        .route(
            "/api/reports/chat",
            post(|Query(params): Query<std::collections::HashMap<String, String>>,
                  Json(body): Json<Value>| async move {
                let history_len = body["conversationHistory"]
                    .as_array()
                    .map(Vec::len)
                    .unwrap_or_default();
                let provider = params.get("provider").cloned().unwrap_or_default();
                (
                    StatusCode::OK,
                    Json(json!({
                        "success": true,
                        "answer": format!("answer ({history_len} prior, provider {provider})")
                    })),
                )
            }),
        )
        .route(
            "/api/health",
            get(|| async {
                Json(json!({
                    "status": "UP",
                    "aiModel": {"available": true, "provider": "local", "model": "medgemma:4b"}
                }))
            }),
        )
}

async fn spawn_service(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

/// A base URL that refuses connections: bind a port, then release it.
async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

#[tokio::test]
async fn text_submission_reaches_ready_and_supports_chat() {
    let base = spawn_service(stub_service()).await;
    let client = AnalysisClient::new(&base);
    let mut session = AnalysisSession::new(Provider::Local);

    session
        .submit_with(&client, Submission::Text(REPORT_TEXT.into()))
        .await
        .unwrap();

    assert_eq!(session.phase(), Phase::Ready);
    let analysis = session.result().unwrap();
    assert!(!analysis.findings.is_empty());
    assert_eq!(session.report_text(), Some(REPORT_TEXT));

    session.ask_with(&client, "Is this normal?").await.unwrap();
    let thread = session.thread().unwrap();
    assert!(!thread.is_pending());
    assert_eq!(thread.messages().len(), 2);
    assert_eq!(
        thread.messages()[1].content,
        "answer (0 prior, provider local)"
    );

    // Second question carries the first exchange as history.
    session.ask_with(&client, "Anything to watch?").await.unwrap();
    assert_eq!(
        session.thread().unwrap().messages()[3].content,
        "answer (2 prior, provider local)"
    );
}

#[tokio::test]
async fn document_submission_round_trips_the_extracted_text() {
    let base = spawn_service(stub_service()).await;
    let client = AnalysisClient::new(&base);
    let mut session = AnalysisSession::new(Provider::Cloud);

    session
        .submit_with(
            &client,
            Submission::Document {
                name: "report.txt".into(),
                bytes: REPORT_TEXT.as_bytes().to_vec(),
            },
        )
        .await
        .unwrap();

    assert_eq!(session.phase(), Phase::Ready);
    // The stub "extracts" the uploaded bytes as the canonical text.
    assert_eq!(session.report_text(), Some(REPORT_TEXT));
}

#[tokio::test]
async fn service_rejection_surfaces_the_backend_error_verbatim() {
    let base = spawn_service(stub_service()).await;
    let client = AnalysisClient::new(&base);
    let mut session = AnalysisSession::new(Provider::Local);

    session
        .submit_with(
            &client,
            Submission::Text("this report is unparseable nonsense".into()),
        )
        .await
        .unwrap();

    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(session.error_message(), Some("Could not parse report"));
}

#[tokio::test]
async fn unreachable_service_yields_the_connectivity_message() {
    let base = refused_url().await;
    let client = AnalysisClient::new(&base);
    let mut session = AnalysisSession::new(Provider::Local);

    session
        .submit_with(
            &client,
            Submission::Document {
                name: "report.pdf".into(),
                bytes: vec![0x25, 0x50, 0x44, 0x46],
            },
        )
        .await
        .unwrap();

    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(session.error_message(), Some(CONNECTIVITY_FALLBACK));
}

#[tokio::test]
async fn garbage_response_is_malformed_not_a_panic() {
    let app = Router::new().route(
        "/api/reports/analyze/text",
        post(|| async { "this is not json" }),
    );
    let base = spawn_service(app).await;
    let client = AnalysisClient::new(&base);

    let result = client.analyze_text(REPORT_TEXT, Provider::Local).await;
    assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
}

#[tokio::test]
async fn health_endpoint_reports_model_availability() {
    let base = spawn_service(stub_service()).await;
    let client = AnalysisClient::new(&base);

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "UP");
    assert!(health.ai_model.available);
    assert_eq!(health.ai_model.model, "medgemma:4b");
}
