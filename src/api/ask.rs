//! Gateway endpoint
//!
//! `POST /ask-gemini` (and the legacy `POST /api/v3/modal/ai`) run the
//! request through the dispatch pipeline. The body is read as raw bytes so a
//! malformed body is still audited (as `null`).

use axum::{
    body::Bytes,
    extract::{ConnectInfo, MatchedPath},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use quotagate_core::{AskRequest, DispatchPipeline};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

/// Header carrying the caller's registration number
pub const IDENTIFIER_HEADER: &str = "registration-number";

/// Underscore spelling some clients send
const IDENTIFIER_HEADER_ALT: &str = "registration_number";

/// Create gateway routes
pub fn ask_routes() -> Router {
    Router::new()
        .route("/ask-gemini", post(ask))
        .route("/api/v3/modal/ai", post(ask))
}

async fn ask(
    Extension(pipeline): Extension<Arc<DispatchPipeline>>,
    matched: Option<MatchedPath>,
    method: Method,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let endpoint = matched
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "/ask-gemini".to_string());

    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let mut request = AskRequest::new(endpoint, identifier(&headers).as_deref(), body)
        .with_client(
            client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr)),
            header_str(&headers, "user-agent"),
        );
    request.method = method.to_string();

    let response = pipeline.handle(request).await;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn identifier(headers: &HeaderMap) -> Option<String> {
    header_str(headers, IDENTIFIER_HEADER).or_else(|| header_str(headers, IDENTIFIER_HEADER_ALT))
}

/// First `X-Forwarded-For` hop, else the socket peer
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::TestApp;
    use axum::body::Body;
    use axum::http::Request;
    use quotagate_core::{AccountStore, LogStore, NewAccount};
    use quotagate_llm::DispatchError;
    use serde_json::json;
    use std::time::Duration;

    fn ask_request(uri: &str, identifier: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("user-agent", "router-test")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1");
        if let Some(id) = identifier {
            builder = builder.header(IDENTIFIER_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("127.0.0.1"));

        headers.insert("x-forwarded-for", "198.51.100.1, 10.0.0.2".parse().unwrap());
        assert_eq!(
            client_ip(&headers, Some(peer)).as_deref(),
            Some("198.51.100.1")
        );
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_identifier_header_spellings() {
        let mut headers = HeaderMap::new();
        assert_eq!(identifier(&headers), None);
        headers.insert(IDENTIFIER_HEADER_ALT, "R2".parse().unwrap());
        assert_eq!(identifier(&headers).as_deref(), Some("R2"));
        headers.insert(IDENTIFIER_HEADER, "R1".parse().unwrap());
        assert_eq!(identifier(&headers).as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn test_ask_returns_trimmed_answer() {
        let app = TestApp::new(Ok("  B \n".to_string())).await;
        let account = app
            .services
            .accounts
            .create(NewAccount::new("Alice", "R1"))
            .await
            .unwrap();

        let (status, body) = app
            .send(ask_request("/ask-gemini", Some("R1"), r#"{"prompt":"2+2?"}"#))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "answer": "B" }));

        app.services.pipeline.drain().await;
        let account = app.services.accounts.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(account.quota_used, 1);

        let logs = app.services.logs.recent(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].endpoint, "/ask-gemini");
        assert_eq!(logs[0].ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(logs[0].user_agent.as_deref(), Some("router-test"));
    }

    #[tokio::test]
    async fn test_legacy_route_is_served() {
        let app = TestApp::new(Ok("C".to_string())).await;
        app.services
            .accounts
            .create(NewAccount::new("Bob", "R9"))
            .await
            .unwrap();

        let (status, body) = app
            .send(ask_request("/api/v3/modal/ai", Some("R9"), r#"{"prompt":"q"}"#))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "C");

        app.services.pipeline.drain().await;
        let logs = app.services.logs.recent(10).await.unwrap();
        assert_eq!(logs[0].endpoint, "/api/v3/modal/ai");
    }

    #[tokio::test]
    async fn test_missing_identifier_is_bad_request() {
        let app = TestApp::new(Ok("B".to_string())).await;
        let (status, body) = app
            .send(ask_request("/ask-gemini", None, r#"{"prompt":"q"}"#))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(app.dispatch_calls(), 0);

        app.services.pipeline.drain().await;
        let logs = app.services.logs.recent(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].response_status, 400);
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_not_found() {
        let app = TestApp::new(Ok("B".to_string())).await;
        let (status, body) = app
            .send(ask_request("/ask-gemini", Some("nobody"), r#"{"prompt":"q"}"#))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not Authorized" }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_prompt() {
        let app = TestApp::new(Ok("B".to_string())).await;
        app.services
            .accounts
            .create(NewAccount::new("Alice", "R1"))
            .await
            .unwrap();

        let (status, body) = app
            .send(ask_request("/ask-gemini", Some("R1"), "not json"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid prompt" }));

        app.services.pipeline.drain().await;
        let logs = app.services.logs.recent(10).await.unwrap();
        assert_eq!(logs[0].request_payload, Value::Null);
    }

    #[tokio::test]
    async fn test_back_to_back_requests_hit_cooldown() {
        let app = TestApp::with_window(Ok("B".to_string()), Duration::from_secs(60)).await;
        app.services
            .accounts
            .create(NewAccount::new("Alice", "R1"))
            .await
            .unwrap();

        let (first, _) = app
            .send(ask_request("/ask-gemini", Some("R1"), r#"{"prompt":"a"}"#))
            .await;
        let (second, body) = app
            .send(ask_request("/ask-gemini", Some("R1"), r#"{"prompt":"b"}"#))
            .await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Cooldown in progress. Try again later.");
        assert_eq!(app.dispatch_calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_rate_limit_maps_to_500() {
        let app = TestApp::new(Err(DispatchError::RateLimited)).await;
        app.services
            .accounts
            .create(NewAccount::new("Alice", "R1"))
            .await
            .unwrap();

        let (status, body) = app
            .send(ask_request("/ask-gemini", Some("R1"), r#"{"prompt":"q"}"#))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Rate limited" }));
    }
}
