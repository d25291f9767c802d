//! Ollama transport and judge gateway against a mock HTTP server

use std::time::Duration;

use ali_core::{
    AliError, ChatTransport, Judge, JudgeGateway, JudgeOptions, OllamaClient, RetryPolicy,
};
use ali_core::judge::ChatRequest;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, model: &str) -> OllamaClient {
    OllamaClient::new(server.uri(), model, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn chat_sends_messages_and_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.1:8b",
            "stream": false,
            "messages": [
                {"role": "system", "content": "facts"},
                {"role": "user", "content": "question"}
            ],
            "options": {"temperature": 0.0, "top_p": 0.5, "seed": 42}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1:8b",
            "message": {"role": "assistant", "content": "{\"Answer\": \"no\"}"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = JudgeOptions::default().with_temperature(0.0).with_seed(42);
    let request = ChatRequest::new("facts", "question", options);
    let text = client(&server, "llama3.1:8b").chat(&request).await.unwrap();
    assert_eq!(text, "{\"Answer\": \"no\"}");
}

#[tokio::test]
async fn chat_without_message_content_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&server)
        .await;

    let request = ChatRequest::new("facts", "question", JudgeOptions::default());
    let err = client(&server, "llama3.1:8b").chat(&request).await.unwrap_err();
    assert!(matches!(err, AliError::Transport(_)));
}

#[tokio::test]
async fn gateway_degrades_to_empty_text_after_five_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .expect(5)
        .mount(&server)
        .await;

    let gateway = JudgeGateway::new(client(&server, "llama3.1:8b"))
        .with_retry_policy(RetryPolicy::immediate(5));
    let answer = gateway.ask("facts", "question", &JudgeOptions::default()).await;
    assert_eq!(answer, "");
}

#[tokio::test]
async fn generate_returns_response_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"prompt": "Why is the sky blue?", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Rayleigh scattering.",
            "done": true
        })))
        .mount(&server)
        .await;

    let text = client(&server, "llama3.1:8b")
        .generate("Why is the sky blue?", &JudgeOptions::default())
        .await
        .unwrap();
    assert_eq!(text, "Rayleigh scattering.");
}

#[tokio::test]
async fn model_listing_accepts_installed_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "llama3.1:8b", "model": "llama3.1:8b", "size": 4661224676u64},
                {"name": "mistral:latest", "model": "mistral:latest"}
            ]
        })))
        .mount(&server)
        .await;

    let installed = client(&server, "mistral:latest");
    assert_eq!(installed.list_models().await.unwrap().len(), 2);
    installed.ensure_model_available().await.unwrap();

    let err = client(&server, "phi3").ensure_model_available().await.unwrap_err();
    match err {
        AliError::Configuration(message) => {
            assert!(message.contains("phi3"));
            assert!(message.contains("llama3.1:8b"));
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_server_does_not_fail_model_check() {
    // Nothing listens on the discard port.
    let client =
        OllamaClient::new("http://127.0.0.1:9", "llama3.1:8b", Duration::from_millis(200)).unwrap();
    assert!(client.ensure_model_available().await.is_ok());
}
