//! Integration tests for the chat-completions client against a mock provider.

use std::sync::Arc;

use forum_digest::config::Config;
use forum_digest::llm::{ChatClient, ChatMessage, ChatRequest, GenerationError, Summarizer, TextGenerator};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_client(server: &MockServer) -> ChatClient {
    let config = Config {
        llm_api_url: format!("{}/v1/chat/completions", server.uri()),
        llm_api_key: "sk-test".to_string(),
        llm_model: "gpt-test".to_string(),
        ..Config::for_testing()
    };
    ChatClient::new(&config).expect("Failed to build client")
}

fn request() -> ChatRequest {
    ChatRequest {
        messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hello")],
        max_tokens: 50,
    }
}

#[tokio::test]
async fn test_generate_sends_chat_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "max_tokens": 50,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  Hi there!  "}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = chat_client(&server)
        .generate(&request())
        .await
        .expect("generation failed");
    assert_eq!(text, "Hi there!");
}

#[tokio::test]
async fn test_quota_error_is_generation_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "You exceeded your current quota"}
        })))
        .mount(&server)
        .await;

    let err = chat_client(&server).generate(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::GenerationFailed(_)), "{err}");
}

#[tokio::test]
async fn test_missing_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = chat_client(&server).generate(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::MalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn test_summarizer_never_fails_on_provider_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Arc::new(chat_client(&server)), "Test Forum");

    let simplified = summarizer.simplify("<p>Zero-knowledge proofs</p>").await;
    assert!(!simplified.is_empty());

    let synthesized = summarizer
        .synthesize(
            &["a".to_string(), "b".to_string()],
            forum_digest::llm::SynthesisContext::Thread,
        )
        .await;
    assert!(!synthesized.is_empty());
}
