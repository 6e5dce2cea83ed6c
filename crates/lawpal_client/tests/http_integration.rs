//! Integration tests for the backend HTTP client: submit form, chat query,
//! chat history. Uses a minimal in-process axum backend (no mocks).

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lawpal_client::{Client, FormPayload, RequestError, USER_ID_HEADER};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// What the backend saw, one entry per request.
#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    user_id: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    fn record(&self, method: Method, path: String, headers: &HeaderMap, body: Option<Value>) {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen.lock().unwrap().push(Seen {
            method,
            path,
            user_id,
            body,
        });
    }

    fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

async fn submit_form(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.record(Method::POST, "/submit-form".into(), &headers, Some(body));
    (
        StatusCode::CREATED,
        Json(json!({"message": "Form submitted successfully!"})),
    )
}

async fn chat(
    State(backend): State<Backend>,
    Path(service): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record(Method::POST, format!("/{service}/chat"), &headers, Some(body));
    match service.as_str() {
        "broken" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "model unavailable"})),
        )
            .into_response(),
        "not-json" => (StatusCode::OK, "plain text").into_response(),
        _ => Json(json!({"answer": "An H1B is a US work visa."})).into_response(),
    }
}

async fn history(
    State(backend): State<Backend>,
    Path(service): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    backend.record(Method::GET, format!("/{service}/history"), &headers, None);
    if service == "unknown" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid service category"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"history": [
            {"role": "user", "content": "What is an H1B?"},
            {"role": "bot", "content": "An H1B is a US work visa."}
        ]})),
    )
}

/// Start the backend on an ephemeral port; returns its base URL.
async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/submit-form", post(submit_form))
        .route("/{service}/chat", post(chat))
        .route("/{service}/history", get(history))
        .with_state(backend.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://127.0.0.1:{}", port), backend)
}

#[tokio::test]
async fn submit_form_posts_payload_verbatim() {
    let (url, backend) = spawn_backend().await;
    let client = Client::new(&url);

    let payload = FormPayload::from([
        ("firstName".to_string(), "Asha".to_string()),
        ("email".to_string(), "asha@example.com".to_string()),
        ("message".to_string(), "  spaces kept  ".to_string()),
    ]);
    let reply = client
        .submit_form(&payload)
        .await
        .expect("submit should succeed");

    assert_eq!(reply, json!({"message": "Form submitted successfully!"}));
    let seen = backend.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::POST);
    assert_eq!(seen[0].path, "/submit-form");
    assert_eq!(
        seen[0].body.as_ref().unwrap(),
        &serde_json::to_value(&payload).unwrap()
    );
}

#[tokio::test]
async fn chat_query_sends_identity_header_and_returns_reply_unchanged() {
    let (url, backend) = spawn_backend().await;
    let client = Client::new(&url);

    let reply = client
        .send_chat_query("immigration", "What is an H1B?", "user-42")
        .await
        .expect("chat should succeed");

    assert_eq!(reply, json!({"answer": "An H1B is a US work visa."}));
    let seen = backend.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/immigration/chat");
    assert_eq!(seen[0].user_id.as_deref(), Some("user-42"));
    assert_eq!(seen[0].body, Some(json!({"query": "What is an H1B?"})));
}

#[tokio::test]
async fn chat_history_is_a_get_with_identity_header() {
    let (url, backend) = spawn_backend().await;
    // Trailing slash on the base URL must not double up.
    let client = Client::new(&format!("{url}/"));

    let reply = client
        .get_chat_history("consultation", "user-7")
        .await
        .expect("history should succeed");

    assert_eq!(reply["history"][1]["role"], "bot");
    assert_eq!(reply["history"].as_array().unwrap().len(), 2);
    let seen = backend.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, Method::GET);
    assert_eq!(seen[0].path, "/consultation/history");
    assert_eq!(seen[0].user_id.as_deref(), Some("user-7"));
    assert!(seen[0].body.is_none());
}

#[tokio::test]
async fn non_success_status_is_a_request_error_with_status() {
    let (url, backend) = spawn_backend().await;
    let client = Client::new(&url);

    let err = client
        .send_chat_query("broken", "hello", "u")
        .await
        .expect_err("500 should fail");
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    match &err {
        RequestError::Status { body, .. } => assert!(body.contains("model unavailable")),
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(err.to_string().contains("500"));

    let err = client
        .get_chat_history("unknown", "u")
        .await
        .expect_err("400 should fail");
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    // One request each: no retries.
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn missing_route_fails_submit_form() {
    // Backend without /submit-form answers 404.
    let app = Router::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let client = Client::new(&format!("http://127.0.0.1:{port}"));

    let err = client
        .submit_form(&FormPayload::new())
        .await
        .expect_err("404 should fail");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn undecodable_body_is_a_request_error() {
    let (url, _backend) = spawn_backend().await;
    let client = Client::new(&url);

    let err = client
        .send_chat_query("not-json", "q", "u")
        .await
        .expect_err("plain text should fail to decode");
    assert!(matches!(err, RequestError::Decode { .. }));
    assert_eq!(err.status(), Some(StatusCode::OK));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let client = Client::new(&format!("http://127.0.0.1:{port}"));

    let err = client
        .get_chat_history("consultation", "u")
        .await
        .expect_err("connection should be refused");
    assert!(matches!(err, RequestError::Transport(_)));
    assert_eq!(err.status(), None);
}
