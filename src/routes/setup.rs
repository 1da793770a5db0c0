//! Setup routes: channel configuration form.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, info};

use super::html_page;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetupForm {
    pub channel_id: String,
    pub client_id: String,
    pub client_secret: String,
}

/// `GET /setup`: configuration form.
pub async fn setup_form(State(state): State<AppState>) -> Response {
    let current = state.config.current().await;
    html_page(state.pages.setup(current.as_ref()))
}

/// `POST /setup`: persist the config and render a confirmation.
pub async fn setup_submit(State(state): State<AppState>, Form(form): Form<SetupForm>) -> Response {
    match state
        .config
        .save(&form.channel_id, &form.client_id, &form.client_secret)
        .await
    {
        Ok(config) => {
            info!(channel_id = %config.channel_id, path = %state.config.path().display(), "channel configuration saved");
            html_page(state.pages.setup_done(&config))
        }
        Err(e) => {
            error!(error = %e, "channel configuration save failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save configuration").into_response()
        }
    }
}

#[cfg(test)]
#[path = "setup_test.rs"]
mod tests;
