//! Integration tests for the backend client using wiremock.

use std::time::Duration;

use eimemes::backend::BackendClient;
use eimemes::client::{Client, ClientError, StreamingClient};
use eimemes::options::{ModelOptions, TransportOptions};
use eimemes::stream::Termination;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(payloads: &[&str]) -> String {
    let mut body = String::new();
    for payload in payloads {
        body.push_str("data: ");
        body.push_str(payload);
        body.push_str("\n\n");
    }
    body
}

fn client_for(server: &MockServer) -> BackendClient {
    BackendClient::new(
        ModelOptions::default(),
        TransportOptions::new(server.uri()).with_token("test-token"),
    )
}

#[tokio::test]
async fn stream_complete_text_response() {
    let mock_server = MockServer::start().await;

    let sse = sse_body(&[
        r#"{"content":"Hello"}"#,
        r#"{"content":", "}"#,
        r#"{"content":"world"}"#,
        "[DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "message": "hi",
            "model": "llama3-8b-8192",
            "stream": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let mut deltas = Vec::new();
    let completion = client
        .chat_stream(
            "hi",
            &mut |delta: &str| deltas.push(delta.to_string()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(completion.text, "Hello, world");
    assert_eq!(completion.termination, Termination::Sentinel);
    assert_eq!(deltas, vec!["Hello", ", ", "world"]);
}

#[tokio::test]
async fn stream_skips_malformed_frames() {
    let mock_server = MockServer::start().await;

    let sse = format!(
        ": ping\n\n{}",
        sse_body(&[r#"{"content":"a"}"#, "{oops", r#"{"content":"b"}"#])
    );

    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let completion = client
        .chat_stream("hi", &mut |_: &str| {}, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(completion.text, "ab");
    assert_eq!(completion.termination, Termination::Closed);
}

#[tokio::test]
async fn stream_cancelled_after_two_deltas() {
    let mock_server = MockServer::start().await;

    let sse = sse_body(&[
        r#"{"content":"one"}"#,
        r#"{"content":"two"}"#,
        r#"{"content":"three"}"#,
        r#"{"content":"four"}"#,
        "[DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let cancel = CancellationToken::new();
    let mut deltas = Vec::new();
    let err = client
        .chat_stream(
            "hi",
            &mut |delta: &str| {
                deltas.push(delta.to_string());
                if deltas.len() == 2 {
                    cancel.cancel();
                }
            },
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(deltas, vec!["one", "two"]);
}

#[tokio::test]
async fn stream_error_status_is_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Invalid token"})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let mut calls = 0;
    let err = client
        .chat_stream("hi", &mut |_: &str| calls += 1, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::ProviderError(ref msg) if msg == "Invalid token"));
    assert!(!err.is_cancelled());
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn stream_cancelled_while_waiting_for_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&[r#"{"content":"late"}"#]), "text/event-stream")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let mut calls = 0;
    let err = client
        .chat_stream("hi", &mut |_: &str| calls += 1, &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn complete_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({"stream": false, "max_tokens": 64})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "Paris"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let options = ModelOptions::default().with_max_tokens(64);
    let response = client
        .request("Capital of France?", &options)
        .await
        .unwrap();

    assert_eq!(response.response, "Paris");
}

#[tokio::test]
async fn complete_response_plain_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.chat("hi").await.unwrap_err();

    assert!(
        matches!(err, ClientError::ProviderError(ref msg) if msg == "HTTP 500 Internal Server Error: boom")
    );
}

#[tokio::test]
async fn list_models() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/chat/models"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [
                {"id": "llama3-8b-8192", "name": "Llama 3 8B"},
                {"id": "mixtral-8x7b-32768", "name": "Mixtral 8x7B"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let models = client.list_models().await.unwrap();

    let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["llama3-8b-8192", "mixtral-8x7b-32768"]);
}
