//! Chat routes: index page, on-demand fetch, archive.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::error;

use super::auth::{BrowserSession, fresh_credentials};
use super::{html_page, setup_redirect};
use crate::pages::FETCH_FAILED_MESSAGE;
use crate::services::archive::{self, ChatMessage};
use crate::services::fetcher;
use crate::state::AppState;

async fn fetch_for_session(state: &AppState, session: &BrowserSession) -> Vec<ChatMessage> {
    let credentials = fresh_credentials(state, session).await;
    fetcher::fetch_recent_messages(state.chat_api.as_ref(), &state.pool, &state.options.filter, credentials.as_ref())
        .await
}

/// `GET /`: setup redirect, logged-out page, or the freshly fetched chat.
pub async fn index(State(state): State<AppState>, session: BrowserSession) -> Response {
    let Some(config) = state.config.current().await else {
        return setup_redirect();
    };
    if session.credentials.is_none() {
        return html_page(state.pages.logged_out());
    }

    let comments = fetch_for_session(&state, &session).await;
    let error = comments.is_empty().then_some(FETCH_FAILED_MESSAGE);
    html_page(state.pages.index(&config, &comments, error))
}

/// `GET /fetch_comments`: the freshly fetched batch as JSON. Empty when the
/// session has no credentials or the fetch fails.
pub async fn fetch_comments(State(state): State<AppState>, session: BrowserSession) -> Response {
    if !state.config.is_configured().await {
        return setup_redirect();
    }
    Json(fetch_for_session(&state, &session).await).into_response()
}

/// `GET /archive`: every archived message, newest first.
pub async fn archive(State(state): State<AppState>) -> Response {
    if !state.config.is_configured().await {
        return setup_redirect();
    }
    match archive::list_all(&state.pool).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => {
            error!(error = %e, "archive listing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read archive").into_response()
        }
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
