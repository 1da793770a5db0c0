use super::*;
use crate::services::youtube::ChatApiError;
use crate::state::test_helpers::{
    MockChatApi, chat_item, configured_app_state, test_app_state, test_credentials,
};
use axum::http::header;
use std::sync::Arc;

async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

fn logged_in() -> BrowserSession {
    BrowserSession { token: None, credentials: Some(test_credentials()) }
}

// =============================================================================
// index
// =============================================================================

#[tokio::test]
async fn index_unconfigured_redirects_to_setup() {
    let state = test_app_state(Arc::new(MockChatApi::offline())).await;
    let resp = index(State(state), logged_in()).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/setup");
}

#[tokio::test]
async fn index_logged_out_renders_login_link() {
    let api = Arc::new(MockChatApi::live("chat-1", vec![chat_item("m1", "x", "2025-03-01T10:00:00Z")]));
    let state = configured_app_state(api.clone()).await;

    let resp = index(State(state), BrowserSession::anonymous()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(r#"href="/login""#));
    assert_eq!(api.list_calls(), 0, "logged-out view must not hit the API");
}

#[tokio::test]
async fn index_logged_in_renders_comments() {
    let api = Arc::new(MockChatApi::live("chat-1", vec![chat_item("m1", "hello stream", "2025-03-01T10:00:00Z")]));
    let state = configured_app_state(api).await;

    let resp = index(State(state), logged_in()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("hello stream"));
    assert!(!html.contains(FETCH_FAILED_MESSAGE));
}

#[tokio::test]
async fn index_logged_in_offline_shows_error_banner() {
    let state = configured_app_state(Arc::new(MockChatApi::offline())).await;
    let resp = index(State(state), logged_in()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains(FETCH_FAILED_MESSAGE));
}

// =============================================================================
// fetch_comments
// =============================================================================

#[tokio::test]
async fn fetch_comments_without_credentials_is_empty_list() {
    let api = Arc::new(MockChatApi::live("chat-1", vec![chat_item("m1", "x", "2025-03-01T10:00:00Z")]));
    let state = configured_app_state(api).await;

    let resp = fetch_comments(State(state), BrowserSession::anonymous()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!([]));
}

#[tokio::test]
async fn fetch_comments_returns_batch_shape() {
    let api = Arc::new(MockChatApi::live("chat-1", vec![chat_item("m1", "hej", "2025-03-01T10:00:00Z")]));
    let state = configured_app_state(api).await;

    let resp = fetch_comments(State(state), logged_in()).await;
    assert_eq!(
        body_json(resp).await,
        serde_json::json!([{"author": "viewer", "message": "hej", "timestamp": "2025-03-01T10:00:00Z"}])
    );
}

#[tokio::test]
async fn fetch_comments_api_failure_is_empty_list() {
    let api = Arc::new(MockChatApi::failing(|| ChatApiError::Transport("dns".into())));
    let state = configured_app_state(api).await;

    let resp = fetch_comments(State(state), logged_in()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!([]));
}

#[tokio::test]
async fn fetch_comments_respects_content_filter() {
    let api = Arc::new(MockChatApi::live(
        "chat-1",
        vec![chat_item("m1", "plain", "2025-03-01T10:00:00Z"), chat_item("m2", "Æ!", "2025-03-01T10:00:01Z")],
    ));
    let mut state = configured_app_state(api).await;
    let mut options = (*state.options).clone();
    options.filter = crate::services::fetcher::ContentFilter::marker("Æ");
    state.options = Arc::new(options);

    let resp = fetch_comments(State(state.clone()), logged_in()).await;
    let body = body_json(resp).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["message"], "Æ!");
    assert_eq!(archive::count(&state.pool).await.unwrap(), 1);
}

// =============================================================================
// archive
// =============================================================================

#[tokio::test]
async fn archive_is_newest_first_regardless_of_session() {
    let state = configured_app_state(Arc::new(MockChatApi::offline())).await;
    for (id, ts) in [("a", "2025-03-01T10:00:01Z"), ("c", "2025-03-01T10:00:03Z"), ("b", "2025-03-01T10:00:02Z")] {
        let message = ChatMessage { id: id.into(), author: "x".into(), message: id.into(), timestamp: ts.into() };
        archive::upsert(&state.pool, &message).await.unwrap();
    }

    let resp = archive(State(state)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let order: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["message"].as_str())
        .collect();
    assert_eq!(order, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn archive_storage_failure_is_server_error() {
    let state = configured_app_state(Arc::new(MockChatApi::offline())).await;
    sqlx::query("DROP TABLE live_chat").execute(&state.pool).await.unwrap();
    let resp = archive(State(state)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
