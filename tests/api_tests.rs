use travel_assistant::config::{FallbackDelay, ResponderConfig};
use travel_assistant::message::{ErrorResponse, Message, Role};
use travel_assistant::routes::create_router;
use travel_assistant::rules::{
    BOOKING_DETAILS_REPLY, DEFAULT_REPLY, FLIGHT_REPLY, PAYMENT_PROMPT_REPLY,
};
use travel_assistant::services::metrics_manager::MetricsData;
use travel_assistant::state::AppState;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower::util::ServiceExt;

fn config(api_key: Option<&str>, endpoint: &str) -> ResponderConfig {
    ResponderConfig {
        api_key: api_key.map(str::to_string),
        model_endpoint: endpoint.to_string(),
        fallback_delay: FallbackDelay::disabled(),
        ..ResponderConfig::default()
    }
}

fn app(responder: &ResponderConfig) -> Router {
    let state = Arc::new(AppState::new(responder).unwrap());
    create_router("public").with_state(state)
}

fn chat_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn user_body(text: &str) -> String {
    json!({ "messages": [{ "role": "user", "content": text }] }).to_string()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn ask(app: Router, text: &str) -> Message {
    let (status, bytes) = send(app, chat_request(user_body(text))).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&bytes).unwrap()
}

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    keys: Arc<Mutex<Vec<String>>>,
}

/// Serve a stand-in model endpoint that answers every POST with `status` and `body`.
async fn fake_model(status: StatusCode, body: &'static str) -> (String, Captured) {
    slow_model(status, body, Duration::ZERO).await
}

/// Like `fake_model`, but waits `delay` after recording the request.
async fn slow_model(status: StatusCode, body: &'static str, delay: Duration) -> (String, Captured) {
    let captured = Captured::default();

    let handler = move |State(captured): State<Captured>,
                        Query(query): Query<HashMap<String, String>>,
                        Json(request): Json<Value>| async move {
        captured.bodies.lock().unwrap().push(request);
        if let Some(key) = query.get("key") {
            captured.keys.lock().unwrap().push(key.clone());
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (status, [("content-type", "application/json")], body).into_response()
    };

    let router = Router::new()
        .route("/generate", post(handler))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}/generate"), captured)
}

async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/generate")
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, bytes) = send(
        app(&config(None, "http://unused")),
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"OK");
}

#[tokio::test]
async fn test_fallback_replies_without_api_key() {
    let cfg = config(None, "http://unused");

    let reply = ask(app(&cfg), "I want to book a flight to Goa").await;
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, FLIGHT_REPLY);

    let reply = ask(app(&cfg), "I'd like to book this option").await;
    assert_eq!(reply.content, BOOKING_DETAILS_REPLY);

    let reply = ask(app(&cfg), "My name is Sam, email sam@x.com, phone 555-1234").await;
    assert_eq!(reply.content, PAYMENT_PROMPT_REPLY);
}

#[tokio::test]
async fn test_response_wire_shape() {
    let (status, bytes) = send(
        app(&config(None, "http://unused")),
        chat_request(user_body("hi")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, json!({ "role": "assistant", "content": DEFAULT_REPLY }));
}

#[tokio::test]
async fn test_large_history_is_answered() {
    let long_turn = "x".repeat(3 * 1024 * 1024);
    let body = json!({
        "messages": [
            { "role": "assistant", "content": long_turn },
            { "role": "user", "content": "flight" }
        ]
    })
    .to_string();

    let (status, bytes) = send(app(&config(None, "http://unused")), chat_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Message = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply, Message::assistant(FLIGHT_REPLY));
}

#[tokio::test]
async fn test_missing_messages_is_500() {
    let (status, bytes) = send(
        app(&config(None, "http://unused")),
        chat_request(r#"{"message": "hello"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(err.error.starts_with("Failed to process request:"));
}

#[tokio::test]
async fn test_invalid_json_is_500() {
    let (status, bytes) = send(app(&config(None, "http://unused")), chat_request("not json")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(value.get("error").is_some());
}

#[tokio::test]
async fn test_unknown_role_is_accepted() {
    let body = json!({ "messages": [{ "role": "tool", "content": "flight" }] }).to_string();
    let (status, bytes) = send(app(&config(None, "http://unused")), chat_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Message = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply.content, DEFAULT_REPLY);
}

#[tokio::test]
async fn test_live_reply_and_request_shape() {
    let (endpoint, captured) = fake_model(
        StatusCode::OK,
        r#"{"candidates":[{"content":{"parts":[{"text":"Here are three hotels in Goa."}]}}]}"#,
    )
    .await;
    let cfg = config(Some("test-key"), &endpoint);

    let body = json!({
        "messages": [
            { "role": "system", "content": "dropped" },
            { "role": "user", "content": "hotel in Goa" },
            { "role": "assistant", "content": "When?" },
            { "role": "user", "content": "Next week" }
        ]
    })
    .to_string();
    let (status, bytes) = send(app(&cfg), chat_request(body)).await;
    assert_eq!(status, StatusCode::OK);
    let reply: Message = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply, Message::assistant("Here are three hotels in Goa."));

    assert_eq!(captured.keys.lock().unwrap().as_slice(), ["test-key".to_string()]);
    let sent = captured.bodies.lock().unwrap()[0].clone();
    let contents = sent["contents"].as_array().unwrap();
    let roles: Vec<&str> = contents.iter().map(|t| t["role"].as_str().unwrap()).collect();
    assert_eq!(roles, ["model", "user", "user", "model", "user"]);
    assert!(contents[1]["parts"][0]["text"].as_str().unwrap().contains("Current date:"));
    assert_eq!(contents[4]["parts"][0]["text"], "Next week");
    assert_eq!(sent["generationConfig"]["maxOutputTokens"], 800);
}

#[tokio::test]
async fn test_live_empty_candidates_returns_empty_reply() {
    let (endpoint, _) = fake_model(StatusCode::OK, r#"{"candidates":[]}"#).await;
    let reply = ask(app(&config(Some("k"), &endpoint)), "flight").await;
    assert_eq!(reply, Message::assistant(""));
}

#[tokio::test]
async fn test_live_error_status_falls_back() {
    let (endpoint, captured) = fake_model(StatusCode::SERVICE_UNAVAILABLE, r#"{"error":{}}"#).await;
    let reply = ask(app(&config(Some("k"), &endpoint)), "I want to book a flight to Goa").await;
    assert_eq!(reply.content, FLIGHT_REPLY);
    assert_eq!(captured.bodies.lock().unwrap().len(), 1, "no retries");
}

#[tokio::test]
async fn test_live_garbage_body_falls_back() {
    let (endpoint, _) = fake_model(StatusCode::OK, "<html>oops</html>").await;
    let reply = ask(app(&config(Some("k"), &endpoint)), "I'd like to book this option").await;
    assert_eq!(reply.content, BOOKING_DETAILS_REPLY);
}

#[tokio::test]
async fn test_model_timeout_falls_back() {
    let (endpoint, captured) = slow_model(
        StatusCode::OK,
        r#"{"candidates":[{"content":{"parts":[{"text":"too late"}]}}]}"#,
        Duration::from_secs(5),
    )
    .await;
    let cfg = ResponderConfig {
        request_timeout: Duration::from_millis(200),
        ..config(Some("k"), &endpoint)
    };

    let started = Instant::now();
    let reply = ask(app(&cfg), "I want to book a flight to Goa").await;
    assert_eq!(reply, Message::assistant(FLIGHT_REPLY));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(captured.bodies.lock().unwrap().len(), 1, "no retries");
}

#[tokio::test]
async fn test_transport_failure_matches_offline_reply() {
    let endpoint = closed_endpoint().await;
    let text = "My name is Sam, email sam@x.com, phone 555-1234";

    let live = ask(app(&config(Some("k"), &endpoint)), text).await;
    let offline = ask(app(&config(None, &endpoint)), text).await;
    assert_eq!(live, offline);
    assert_eq!(live.content, PAYMENT_PROMPT_REPLY);
}

#[tokio::test]
async fn test_metrics_track_reply_sources() {
    let state = Arc::new(AppState::new(&config(None, "http://unused")).unwrap());
    let app = create_router("public").with_state(state);

    ask(app.clone(), "flight").await;
    ask(app.clone(), "goa").await;
    ask(app.clone(), "flying").await;

    let (status, bytes) = send(
        app,
        Request::builder().uri("/metrics").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let metrics: MetricsData = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(metrics.source_usage.get("fallback"), Some(&3));
    assert_eq!(metrics.topic_usage.get("flight"), Some(&2));
    assert_eq!(metrics.topic_usage.get("goa"), Some(&1));
}
