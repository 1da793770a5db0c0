use super::*;
use crate::state::test_helpers::{MockChatApi, chat_item, spawn_router, test_app_state, test_credentials};
use std::sync::Arc;

/// Serve the router on an ephemeral port and return its base URL.
async fn spawn_app(state: AppState) -> String {
    spawn_router(app(state)).await
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client should build")
}

fn location(resp: &reqwest::Response) -> Option<&str> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn healthz_ok_even_when_unconfigured() {
    let base = spawn_app(test_app_state(Arc::new(MockChatApi::offline())).await).await;
    let resp = client().get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn unconfigured_routes_redirect_to_setup() {
    let base = spawn_app(test_app_state(Arc::new(MockChatApi::offline())).await).await;
    let http = client();

    for path in ["/", "/login", "/oauth2callback?code=x&state=y", "/logout", "/fetch_comments", "/archive"] {
        let resp = http.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&resp), Some("/setup"), "{path}");
    }

    let resp = http.get(format!("{base}/setup")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn posting_setup_ends_redirects() {
    let state = test_app_state(Arc::new(MockChatApi::offline())).await;
    let config_path = state.config.path().to_path_buf();
    let base = spawn_app(state).await;
    let http = client();

    let resp = http
        .post(format!("{base}/setup"))
        .form(&[("channel_id", "UCnew"), ("client_id", "cid"), ("client_secret", "sec")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("UCnew"));

    let resp = http.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert!(resp.text().await.unwrap().contains(r#"href="/login""#));

    let _ = tokio::fs::remove_file(config_path).await;
}

#[tokio::test]
async fn login_redirects_to_provider_with_state_cookie() {
    let state = crate::state::test_helpers::configured_app_state(Arc::new(MockChatApi::offline())).await;
    let base = spawn_app(state).await;

    let resp = client().get(format!("{base}/login")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::TEMPORARY_REDIRECT);
    let target = location(&resp).unwrap();
    assert!(target.starts_with("https://accounts.example.test/o/oauth2/auth?"));
    assert!(target.contains("prompt=consent"));

    let set_cookie = resp
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.starts_with("oauth_state="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn session_cookie_drives_fetch_and_archive() {
    let api = Arc::new(MockChatApi::live(
        "chat-1",
        vec![chat_item("m1", "first", "2025-03-01T10:00:01Z"), chat_item("m2", "second", "2025-03-01T10:00:02Z")],
    ));
    let state = crate::state::test_helpers::configured_app_state(api).await;
    let token = state.sessions.create(test_credentials()).await;
    let base = spawn_app(state).await;
    let http = client();

    let anon: serde_json::Value = http
        .get(format!("{base}/fetch_comments"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(anon, serde_json::json!([]));

    let fetched: serde_json::Value = http
        .get(format!("{base}/fetch_comments"))
        .header(reqwest::header::COOKIE, format!("session_token={token}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.as_array().map(Vec::len), Some(2));
    assert_eq!(fetched[0]["message"], "first");
    assert!(fetched[0].get("id").is_none());

    let archived: serde_json::Value = http
        .get(format!("{base}/archive"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(archived[0]["message"], "second");
    assert_eq!(archived[1]["message"], "first");
}
