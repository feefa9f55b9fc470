use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use feishu_bot_sdk::token::{CachedToken, TokenManager};
use feishu_bot_sdk::types::{AccessToken, AppId, AppSecret};
use feishu_bot_sdk::{FeishuClient, FeishuError};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

fn create_test_client(base_url: &str) -> FeishuClient {
    FeishuClient::builder()
        .app_id(AppId::new("cli_test_app").unwrap())
        .app_secret(AppSecret::new("test_secret").unwrap())
        .base_url(base_url)
        .build()
        .unwrap()
}

fn token_response(token: &str, expire: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "code": 0,
        "msg": "ok",
        "tenant_access_token": token,
        "expire": expire
    }))
}

#[tokio::test]
async fn test_first_request_fetches_once_then_caches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_json(serde_json::json!({
            "app_id": "cli_test_app",
            "app_secret": "test_secret"
        })))
        .respond_with(token_response("T", 7200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = TokenManager::new(create_test_client(&mock_server.uri()));

    assert_eq!(manager.get_token().await.unwrap(), "T");
    assert_eq!(manager.get_token().await.unwrap(), "T");
    assert_eq!(manager.get_token().await.unwrap(), "T");
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let mock_server = MockServer::start().await;

    // expire=0 makes every cached token already stale
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("t-short-lived", 0))
        .expect(2)
        .mount(&mock_server)
        .await;

    let manager = TokenManager::new(create_test_client(&mock_server.uri()));

    assert_eq!(manager.get_token().await.unwrap(), "t-short-lived");
    assert_eq!(manager.get_token().await.unwrap(), "t-short-lived");
}

#[tokio::test]
async fn test_stale_cache_entry_triggers_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("t-fresh", 7200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let manager = TokenManager::new(create_test_client(&mock_server.uri()));
    *manager.cache.lock().await = Some(CachedToken {
        token: AccessToken::new("t-stale").unwrap(),
        expires_at: Instant::now() - Duration::from_secs(1),
    });

    assert_eq!(manager.get_token().await.unwrap(), "t-fresh");
    assert_eq!(manager.get_token().await.unwrap(), "t-fresh");
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("T", 7200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let manager = TokenManager::new(create_test_client(&mock_server.uri()));

    manager.get_token().await.unwrap();
    manager.invalidate().await;
    assert!(manager.cache.lock().await.is_none());
    manager.get_token().await.unwrap();
}

#[tokio::test]
async fn test_auth_error_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 5,
            "msg": "bad request"
        })))
        .mount(&mock_server)
        .await;

    let manager = TokenManager::new(create_test_client(&mock_server.uri()));
    let err = manager.get_token().await.unwrap_err();

    assert!(err.to_string().contains("bad request"));
    assert!(matches!(err, FeishuError::Api { code: 5, .. }));
    assert!(manager.cache.lock().await.is_none());
}

#[tokio::test]
async fn test_empty_token_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response("", 7200))
        .mount(&mock_server)
        .await;

    let manager = TokenManager::new(create_test_client(&mock_server.uri()));
    let result = manager.get_token().await;

    assert!(matches!(result, Err(FeishuError::Token(_))));
}

#[tokio::test]
async fn test_concurrent() {
    let mock_server = MockServer::start().await;

    let call_count = Arc::new(AtomicU32::new(0));
    let call_count_clone = Arc::clone(&call_count);

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(move |_request: &wiremock::Request| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            token_response("concurrent_test_token", 7200)
        })
        .mount(&mock_server)
        .await;

    let manager = Arc::new(TokenManager::new(create_test_client(&mock_server.uri())));

    let results = futures::future::join_all((0..5).map(|_| {
        let manager = Arc::clone(&manager);
        async move { manager.get_token().await }
    }))
    .await;

    for result in results {
        assert_eq!(result.unwrap(), "concurrent_test_token");
    }
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
}
