//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every route except `/setup` and `/healthz` sends the browser to `/setup`
//! until a channel is configured. After that, session presence decides
//! between the logged-out page and the live chat view.

pub mod auth;
pub mod chat;
pub mod setup;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::pages::PageError;
use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(chat::index))
        .route("/setup", get(setup::setup_form).post(setup::setup_submit))
        .route("/login", get(auth::login))
        .route(auth::CALLBACK_PATH, get(auth::oauth2callback))
        .route("/logout", get(auth::logout))
        .route("/fetch_comments", get(chat::fetch_comments))
        .route("/archive", get(chat::archive))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub(crate) fn setup_redirect() -> Response {
    Redirect::temporary("/setup").into_response()
}

pub(crate) fn html_page(rendered: Result<String, PageError>) -> Response {
    match rendered {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            error!(error = %e, "page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
