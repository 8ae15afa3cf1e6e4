use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use wikikisan_assistant::config::AssistantConfig;
use wikikisan_assistant::conversation::InMemoryConversationStore;
use wikikisan_assistant::providers::{
    Answer, AnswerProvider, ProviderError, ProviderFuture, ProviderResult, SuggestionProvider,
};
use wikikisan_assistant::server::{AppState, build_app};

struct EchoAnswers;

impl AnswerProvider for EchoAnswers {
    fn answer<'a>(&'a self, question: &'a str) -> ProviderFuture<'a, ProviderResult<Answer>> {
        Box::pin(async move { Answer::new(format!("advice for: {question}"), 0.8) })
    }
}

struct DownAnswers;

impl AnswerProvider for DownAnswers {
    fn answer<'a>(&'a self, _question: &'a str) -> ProviderFuture<'a, ProviderResult<Answer>> {
        Box::pin(async { Err::<Answer, _>(ProviderError::Unavailable("model offline".to_string())) })
    }
}

struct FixedSuggestions;

impl SuggestionProvider for FixedSuggestions {
    fn suggestions(&self) -> ProviderFuture<'_, ProviderResult<Vec<String>>> {
        Box::pin(async {
            Ok::<_, ProviderError>(vec![
                "How to increase crop yield?".to_string(),
                "Best fertilizer for rice?".to_string(),
            ])
        })
    }
}

fn app_with(answers: Arc<dyn AnswerProvider>) -> Router {
    let state = AppState::with_parts(
        Arc::new(InMemoryConversationStore::new()),
        answers,
        Arc::new(FixedSuggestions),
        &AssistantConfig::default(),
    );
    build_app(state)
}

fn app() -> Router {
    app_with(Arc::new(EchoAnswers))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn start(app: &Router) -> String {
    let (status, body) = send(app, empty("POST", "/start?language=en")).await;
    assert_eq!(status, StatusCode::OK);
    body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn start_returns_welcome_and_suggestions() {
    let app = app();

    let (status, body) = send(&app, empty("POST", "/start")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["sessionId"].as_str().is_some_and(|s| !s.is_empty()));
    assert_eq!(
        body["welcomeMessage"],
        "Hello! I'm your AI farming assistant. How can I help you?"
    );
    assert_eq!(body["suggestedQuestions"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn start_issues_distinct_sessions() {
    let app = app();
    let first = start(&app).await;
    let second = start(&app).await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn full_conversation_lifecycle() {
    let app = app();
    let session = start(&app).await;

    let (status, reply) = send(
        &app,
        post_json(
            "/message",
            &json!({"sessionId": session, "message": "When to sow wheat?", "language": "en"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["response"], "advice for: When to sow wheat?");
    assert_eq!(reply["intent"], "farming_advice");
    assert_eq!(reply["confidence"], 0.8);
    assert!(reply["suggestedQuestions"].is_array());

    let (status, history) = send(&app, empty("GET", &format!("/history/{session}"))).await;
    assert_eq!(status, StatusCode::OK);
    let turns = history.as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["message"], "When to sow wheat?");
    assert_eq!(turns[0]["response"], reply["response"]);

    let (status, deleted) = send(&app, empty("DELETE", &format!("/delete/{session}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({"status": "deleted"}));

    let (status, body) = send(&app, empty("GET", &format!("/history/{session}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn history_keeps_call_order() {
    let app = app();
    let session = start(&app).await;

    for message in ["m1", "m2"] {
        let (status, _) = send(
            &app,
            post_json(
                "/message",
                &json!({"sessionId": session, "message": message, "language": "en"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = send(&app, empty("GET", &format!("/history/{session}"))).await;
    let messages: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["message"].as_str())
        .collect();
    assert_eq!(messages, vec!["m1", "m2"]);
}

#[tokio::test]
async fn unknown_sessions_are_not_found() {
    let app = app();
    let never_issued = "6f1c2d9e-0000-4000-8000-000000000000";

    let (status, _) = send(&app, empty("GET", &format!("/history/{never_issued}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, empty("DELETE", &format!("/delete/{never_issued}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, empty("GET", "/history/s1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        post_json(
            "/message",
            &json!({"sessionId": never_issued, "message": "hi", "language": "en"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn malformed_message_body_is_rejected() {
    let app = app();
    let session = start(&app).await;

    let (status, body) = send(
        &app,
        post_json("/message", &json!({"sessionId": session, "language": "en"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send(
        &app,
        post_json(
            "/message",
            &json!({"sessionId": session, "message": 42, "language": "en"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, history) = send(&app, empty("GET", &format!("/history/{session}"))).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn provider_failure_is_bad_gateway() {
    let app = app_with(Arc::new(DownAnswers));
    let session = start(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            "/message",
            &json!({"sessionId": session, "message": "hi", "language": "en"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "provider_error");

    let (_, history) = send(&app, empty("GET", &format!("/history/{session}"))).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn conversations_lists_active_sessions() {
    let app = app();
    let session = start(&app).await;
    send(
        &app,
        post_json(
            "/message",
            &json!({"sessionId": session, "message": "Best fertilizer for rice?", "language": "en"}),
        ),
    )
    .await;

    let (status, body) = send(&app, empty("GET", "/conversations")).await;

    assert_eq!(status, StatusCode::OK);
    let listed = body["conversations"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["sessionId"], session.as_str());
    assert_eq!(listed[0]["topic"], "Best fertilizer for rice?");
    assert_eq!(listed[0]["turnCount"], 1);
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(&app(), empty("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn start_without_language_defaults_to_en() {
    let app = app();
    let (status, started) = send(&app, empty("POST", "/start")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, empty("GET", "/conversations")).await;

    let listed = body["conversations"].as_array().unwrap();
    assert_eq!(listed[0]["sessionId"], started["sessionId"]);
    assert_eq!(listed[0]["language"], "en");
}

#[tokio::test]
async fn unreadable_message_body_is_bad_request() {
    let app = app();
    let session = start(&app).await;

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/message")
        .body(Body::from(
            json!({"sessionId": session, "message": "hi", "language": "en"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let broken_json = Request::builder()
        .method("POST")
        .uri("/message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"sessionId\": "))
        .unwrap();
    let (status, body) = send(&app, broken_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (_, history) = send(&app, empty("GET", &format!("/history/{session}"))).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn feedback_rates_a_recorded_answer() {
    let app = app();
    let session = start(&app).await;
    let (_, reply) = send(
        &app,
        post_json(
            "/message",
            &json!({"sessionId": session, "message": "When to sow wheat?", "language": "en"}),
        ),
    )
    .await;
    let message_id = reply["messageId"].as_str().unwrap().to_string();

    let (_, history) = send(&app, empty("GET", &format!("/history/{session}"))).await;
    assert_eq!(history[0]["id"], message_id.as_str());

    let (status, body) = send(
        &app,
        post_json(
            "/feedback",
            &json!({"sessionId": session, "messageId": message_id, "rating": 5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "recorded"}));

    let (status, body) = send(
        &app,
        post_json(
            "/feedback",
            &json!({"sessionId": session, "messageId": message_id, "rating": 9}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn feedback_for_unknown_session_or_turn_is_not_found() {
    let app = app();
    let session = start(&app).await;
    let (_, reply) = send(
        &app,
        post_json(
            "/message",
            &json!({"sessionId": session, "message": "m1", "language": "en"}),
        ),
    )
    .await;
    let never_issued = "6f1c2d9e-0000-4000-8000-000000000000";

    let (status, body) = send(
        &app,
        post_json(
            "/feedback",
            &json!({"sessionId": never_issued, "messageId": reply["messageId"], "rating": 4}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    for message_id in [never_issued, "m1"] {
        let (status, body) = send(
            &app,
            post_json(
                "/feedback",
                &json!({"sessionId": session, "messageId": message_id, "rating": 4}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
