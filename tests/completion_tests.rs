use chat_relay::config::Config;
use chat_relay::services::completion::{CompletionError, CompletionService, OpenAiClient};

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

// Starts a fake upstream on a random port and returns its base url.
async fn spawn_upstream(status: StatusCode, reply: Value) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();

    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorded = recorded.clone();
            let reply = reply.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                recorded.lock().unwrap().push((auth, body));
                (status, Json(reply)).into_response()
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1", addr), seen)
}

fn client(api_base: String, api_key: Option<&str>) -> OpenAiClient {
    let config = Config {
        openai_api_key: api_key.map(str::to_string),
        api_base,
        ..Config::default()
    };
    OpenAiClient::new(&config)
}

#[tokio::test]
async fn returns_first_choice_text() {
    let (base, seen) = spawn_upstream(
        StatusCode::OK,
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Hi there!" }, "finish_reason": "stop" }
            ]
        }),
    )
    .await;

    let reply = client(base, Some("sk-test")).complete("Hello").await.unwrap();
    assert_eq!(reply, "Hi there!");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(
        body,
        &json!({
            "model": "gpt-3.5-turbo",
            "messages": [{ "role": "user", "content": "Hello" }]
        })
    );
}

#[tokio::test]
async fn surfaces_upstream_error_message() {
    let (base, _) = spawn_upstream(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" } }),
    )
    .await;

    let err = client(base, Some("sk-wrong")).complete("Hello").await.unwrap_err();
    match &err {
        CompletionError::Api { status, message } => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "Incorrect API key provided");
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let (base, _) = spawn_upstream(StatusCode::OK, json!({ "choices": [] })).await;

    let err = client(base, Some("sk-test")).complete("Hello").await.unwrap_err();
    assert!(matches!(err, CompletionError::NoChoices));
}

#[tokio::test]
async fn unexpected_shape_is_an_error() {
    let (base, _) = spawn_upstream(StatusCode::OK, json!({ "choices": "nope" })).await;

    let err = client(base, Some("sk-test")).complete("Hello").await.unwrap_err();
    assert!(matches!(err, CompletionError::Http(_)));

    let described = err.to_string();
    assert!(described.contains("error decoding response body"), "{described}");
    assert!(described.contains("expected a sequence"), "{described}");
}

#[tokio::test]
async fn null_content_is_an_error() {
    let (base, _) = spawn_upstream(
        StatusCode::OK,
        json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] }),
    )
    .await;

    let err = client(base, Some("sk-test")).complete("Hello").await.unwrap_err();
    assert!(matches!(err, CompletionError::EmptyContent));
}

#[tokio::test]
async fn missing_key_fails_without_calling_upstream() {
    let (base, seen) = spawn_upstream(StatusCode::OK, json!({})).await;

    let err = client(base, None).complete("Hello").await.unwrap_err();
    assert!(matches!(err, CompletionError::MissingApiKey));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_upstream_is_an_error() {
    // Grab a free port, then close it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{}/v1", addr), Some("sk-test"))
        .complete("Hello")
        .await
        .unwrap_err();
    assert!(matches!(err, CompletionError::Http(_)));
    assert!(!err.to_string().is_empty());
}
