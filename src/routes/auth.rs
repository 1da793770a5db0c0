//! Auth routes: Google OAuth login, callback, logout, and the session extractor.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::{error, info, warn};

use super::setup_redirect;
use crate::services::oauth::{self, CallbackQuery, Credentials, unix_now};
use crate::services::session::generate_token;
use crate::state::{AppState, HttpOptions};

pub(crate) const COOKIE_NAME: &str = "session_token";
pub(crate) const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";
pub(crate) const CALLBACK_PATH: &str = "/oauth2callback";
const DEFAULT_HOST: &str = "localhost:5003";

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// The caller's browser session. Never rejects: a missing or unknown cookie
/// yields a session without credentials.
pub struct BrowserSession {
    pub token: Option<String>,
    pub credentials: Option<Credentials>,
}

impl BrowserSession {
    #[must_use]
    pub fn anonymous() -> Self {
        Self { token: None, credentials: None }
    }
}

impl<S> FromRequestParts<S> for BrowserSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar
            .get(COOKIE_NAME)
            .map(Cookie::value)
            .filter(|t| !t.is_empty())
        else {
            return Ok(Self::anonymous());
        };

        let app_state = AppState::from_ref(state);
        let credentials = app_state.sessions.get(token).await;
        Ok(Self { token: Some(token.to_owned()), credentials })
    }
}

/// Session credentials, refreshed first if the access token has expired.
///
/// A failed refresh keeps the stale token; the API call then fails and the
/// fetch collapses to an empty batch.
pub(crate) async fn fresh_credentials(state: &AppState, session: &BrowserSession) -> Option<Credentials> {
    let credentials = session.credentials.clone()?;
    if !credentials.is_expired(unix_now()) || !credentials.can_refresh() {
        return Some(credentials);
    }

    match state.oauth.refresh(&credentials).await {
        Ok(refreshed) => {
            if let Some(token) = &session.token {
                state.sessions.update(token, refreshed.clone()).await;
            }
            info!("oauth access token refreshed");
            Some(refreshed)
        }
        Err(e) => {
            warn!(error = %e, "oauth token refresh failed");
            Some(credentials)
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Absolute callback URL. Uses `PUBLIC_BASE_URL` when set, otherwise the
/// request's `Host` and `X-Forwarded-Proto` headers.
pub(crate) fn redirect_uri(options: &HttpOptions, headers: &HeaderMap) -> String {
    if let Some(base) = &options.public_base_url {
        return format!("{base}{CALLBACK_PATH}");
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_HOST);
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|p| p.eq_ignore_ascii_case("https"))
        .map_or("http", |_| "https");
    format!("{scheme}://{host}{CALLBACK_PATH}")
}

fn build_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = build_cookie(name, String::new(), secure);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /login`: redirect to the Google authorization page.
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(config) = state.config.current().await else {
        return setup_redirect();
    };

    let oauth_state = generate_token();
    let redirect_uri = redirect_uri(&state.options, &headers);
    let url = match state
        .oauth
        .authorization_url(&config, &redirect_uri, &oauth_state)
    {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "authorization url build failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "OAuth is misconfigured").into_response();
        }
    };

    let mut cookie = build_cookie(OAUTH_STATE_COOKIE_NAME, oauth_state, state.options.cookie_secure);
    cookie.set_max_age(Duration::minutes(10));
    let jar = CookieJar::new().add(cookie);
    (jar, Redirect::temporary(&url)).into_response()
}

/// `GET /oauth2callback`: exchange the code, start a session, redirect to `/`.
pub async fn oauth2callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(config) = state.config.current().await else {
        return setup_redirect();
    };
    let secure = state.options.cookie_secure;
    let redirect_uri = redirect_uri(&state.options, &headers);
    let expected_state = jar.get(OAUTH_STATE_COOKIE_NAME).map(Cookie::value);

    let credentials = match oauth::complete_authorization(
        &state.oauth,
        Some(&config),
        &redirect_uri,
        &params,
        expected_state,
        state.options.insecure_transport,
    )
    .await
    {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "oauth code exchange failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "OAuth code exchange failed").into_response();
        }
    };

    // A fresh login replaces whatever session the browser had.
    if let Some(previous) = jar.get(COOKIE_NAME) {
        state.sessions.remove(previous.value()).await;
    }
    let token = state.sessions.create(credentials).await;
    info!("oauth login completed");

    let jar = jar
        .add(build_cookie(COOKIE_NAME, token, secure))
        .add(expired_cookie(OAUTH_STATE_COOKIE_NAME, secure));
    (jar, Redirect::temporary("/")).into_response()
}

/// `GET /logout`: drop the session, clear the cookie, redirect to `/`.
pub async fn logout(State(state): State<AppState>, session: BrowserSession) -> Response {
    if !state.config.is_configured().await {
        return setup_redirect();
    }
    if let Some(token) = &session.token {
        state.sessions.remove(token).await;
    }

    let jar = CookieJar::new().add(expired_cookie(COOKIE_NAME, state.options.cookie_secure));
    (jar, Redirect::temporary("/")).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
