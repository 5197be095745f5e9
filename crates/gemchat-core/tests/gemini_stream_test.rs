// Streaming tests for the Gemini backend against a local mock server

use futures::StreamExt;
use gemchat_core::{ChatBackend, Error, GeminiBackend, Part, Role};
use gemchat_core::providers::GeminiAuth;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAM_PATH: &str = "/v1beta/models/gemini-test:streamGenerateContent";

fn backend_for(server: &MockServer) -> GeminiBackend {
    GeminiBackend::new(
        Some(GeminiAuth::api_key("test-key")),
        format!("{}/v1beta/models", server.uri()),
    )
}

fn stream_body(fragments: &[&str]) -> String {
    let objects: Vec<String> = fragments
        .iter()
        .map(|text| {
            serde_json::json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
            })
            .to_string()
        })
        .collect();
    format!("[{}]", objects.join(",\r\n"))
}

#[tokio::test]
async fn test_streams_fragments_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&["Hel", "lo, ", "world"])))
        .expect(1)
        .mount(&server)
        .await;

    let session = backend_for(&server)
        .create_session("gemini-test", "be brief")
        .unwrap();

    let stream = session
        .send_streaming(vec![Part::text("hi")])
        .await
        .unwrap();
    let fragments: Vec<String> = stream.map(|fragment| fragment.unwrap()).collect().await;

    assert_eq!(fragments, vec!["Hel", "lo, ", "world"]);

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Model);
    assert_eq!(history[1].parts[0].as_text(), Some("Hello, world"));
}

#[tokio::test]
async fn test_follow_up_turn_carries_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(stream_body(&["ok"])))
        .mount(&server)
        .await;

    let session = backend_for(&server)
        .create_session("gemini-test", "be brief")
        .unwrap();

    for prompt in ["first", "second"] {
        let stream = session
            .send_streaming(vec![Part::text(prompt)])
            .await
            .unwrap();
        let _: Vec<_> = stream.collect().await;
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["parts"][0]["text"], "first");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["parts"][0]["text"], "second");
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
}

#[tokio::test]
async fn test_rejected_request_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"[{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}]"#,
        ))
        .mount(&server)
        .await;

    let session = backend_for(&server)
        .create_session("gemini-test", "")
        .unwrap();

    match session.send_streaming(vec![Part::text("hi")]).await {
        Err(Error::Transport(msg)) => assert!(msg.contains("API key not valid.")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected the request to be rejected"),
    }
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn test_error_object_mid_stream_ends_stream() {
    let server = MockServer::start().await;
    let body = format!(
        "[{},\r\n{}]",
        serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": "partial" }] } }] }),
        serde_json::json!({ "error": { "code": 503, "message": "overloaded" } })
    );
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let session = backend_for(&server)
        .create_session("gemini-test", "")
        .unwrap();
    let items: Vec<_> = session
        .send_streaming(vec![Part::text("hi")])
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "partial");
    assert!(matches!(&items[1], Err(Error::Transport(msg)) if msg.contains("overloaded")));
    assert!(session.history().is_empty());
}
