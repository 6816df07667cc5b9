//! Tests for Gemini dispatcher

use super::config::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use super::provider::GeminiDispatcher;
use super::security::sanitize_api_error;
use super::types::GeminiResponse;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::prompt::PromptTemplate;
use std::time::Duration;

const PRIMARY_PATH: &str = "/models/gemini-1.5-pro-002:generateContent";

fn dispatcher_for(server: &mockito::ServerGuard) -> GeminiDispatcher {
    let config = GeminiConfig::new("test-key-1234567890")
        .with_base_url(server.url())
        .with_timeout(Duration::from_secs(5));
    tokio_test::assert_ok!(GeminiDispatcher::new(config))
}

fn answer_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
    .to_string()
}

#[test]
fn test_config_builder() {
    let config = GeminiConfig::new("test-key")
        .with_model("gemini-1.5-flash")
        .with_fallback_models(vec!["gemini-1.5-flash-8b".to_string()])
        .with_timeout(Duration::from_secs(10));

    assert_eq!(config.api_key, "test-key");
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.model, "gemini-1.5-flash");
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert_eq!(config.model_chain(), vec!["gemini-1.5-flash", "gemini-1.5-flash-8b"]);
}

#[test]
fn test_model_chain_dedup() {
    let config = GeminiConfig::new("k")
        .with_fallback_models(vec![DEFAULT_MODEL.to_string(), "other".to_string()]);
    assert_eq!(config.model_chain(), vec![DEFAULT_MODEL, "other"]);
}

#[test]
fn test_config_debug_masks_key() {
    let config = GeminiConfig::new("AIza1234567890abcdefghij");
    let debug_str = format!("{:?}", config);

    assert!(!debug_str.contains("1234567890"));
    assert!(debug_str.contains("AIza...ghij"));
}

#[test]
fn test_sanitize_api_error() {
    let sanitized = sanitize_api_error("Permission denied: invalid API key");
    assert!(sanitized.contains("authentication"));

    let sanitized = sanitize_api_error("RESOURCE_EXHAUSTED: quota exceeded");
    assert!(sanitized.contains("rate limit"));

    let sanitized = sanitize_api_error("error sending request for url (http://x/m?key=AIzaSecret)");
    assert!(!sanitized.contains("AIzaSecret"));
}

#[test]
fn test_first_text_tolerates_missing_fields() {
    let empty: GeminiResponse = serde_json::from_str("{}").unwrap();
    assert_eq!(empty.first_text(), "");

    let no_parts: GeminiResponse =
        serde_json::from_str(r#"{"candidates":[{"content":{}}]}"#).unwrap();
    assert_eq!(no_parts.first_text(), "");

    let null_candidates: GeminiResponse =
        serde_json::from_str(r#"{"candidates":null}"#).unwrap();
    assert_eq!(null_candidates.first_text(), "");
}

#[tokio::test]
async fn test_dispatch_success_returns_raw_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PRIMARY_PATH)
        .match_query(mockito::Matcher::UrlEncoded(
            "key".into(),
            "test-key-1234567890".into(),
        ))
        .match_body(mockito::Matcher::Regex(
            "Question: What is 2\\+2\\? A\\)3 B\\)4".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(answer_body(" B \n"))
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let answer = dispatcher.dispatch("What is 2+2? A)3 B)4").await;

    assert_eq!(answer, Ok(" B \n".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_dispatch_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PRIMARY_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    assert_eq!(dispatcher.dispatch("q").await, Err(DispatchError::RateLimited));
}

#[tokio::test]
async fn test_dispatch_server_error_fails() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PRIMARY_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .with_body("oops")
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    assert_eq!(dispatcher.dispatch("q").await, Err(DispatchError::Failed));
}

#[tokio::test]
async fn test_dispatch_malformed_body_fails() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PRIMARY_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    assert_eq!(dispatcher.dispatch("q").await, Err(DispatchError::Failed));
}

#[tokio::test]
async fn test_dispatch_missing_answer_is_empty() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PRIMARY_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    assert_eq!(dispatcher.dispatch("q").await, Ok(String::new()));
}

#[tokio::test]
async fn test_dispatch_falls_back_on_rate_limit() {
    let mut server = mockito::Server::new_async().await;
    let primary = server
        .mock("POST", PRIMARY_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(429)
        .create_async()
        .await;
    let fallback = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(answer_body("C"))
        .create_async()
        .await;

    let config = GeminiConfig::new("test-key-1234567890")
        .with_base_url(server.url())
        .with_fallback_models(vec!["gemini-1.5-flash".to_string()]);
    let dispatcher = GeminiDispatcher::new(config).unwrap();

    assert_eq!(dispatcher.dispatch("q").await, Ok("C".to_string()));
    primary.assert_async().await;
    fallback.assert_async().await;
}

#[tokio::test]
async fn test_dispatch_no_fallback_on_client_error() {
    let mut server = mockito::Server::new_async().await;
    let _primary = server
        .mock("POST", PRIMARY_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"bad","status":"INVALID_ARGUMENT"}}"#)
        .create_async()
        .await;
    let fallback = server
        .mock("POST", "/models/gemini-1.5-flash:generateContent")
        .match_query(mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let config = GeminiConfig::new("test-key-1234567890")
        .with_base_url(server.url())
        .with_fallback_models(vec!["gemini-1.5-flash".to_string()]);
    let dispatcher = GeminiDispatcher::new(config).unwrap();

    assert_eq!(dispatcher.dispatch("q").await, Err(DispatchError::Failed));
    fallback.assert_async().await;
}

#[tokio::test]
async fn test_dispatch_custom_template() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PRIMARY_PATH)
        .match_query(mockito::Matcher::Any)
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"contents":[{"parts":[{"text":"Answer briefly: hello"}]}]}"#.to_string(),
        ))
        .with_status(200)
        .with_body(answer_body("hi"))
        .create_async()
        .await;

    let config = GeminiConfig::new("test-key-1234567890")
        .with_base_url(server.url())
        .with_template(PromptTemplate::new("Answer briefly: {prompt}"));
    let dispatcher = GeminiDispatcher::new(config).unwrap();

    assert_eq!(dispatcher.dispatch("hello").await, Ok("hi".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_dispatch_network_failure() {
    let config = GeminiConfig::new("test-key-1234567890")
        .with_base_url("http://127.0.0.1:1")
        .with_timeout(Duration::from_secs(2));
    let dispatcher = GeminiDispatcher::new(config).unwrap();

    assert_eq!(dispatcher.dispatch("q").await, Err(DispatchError::Failed));
}
