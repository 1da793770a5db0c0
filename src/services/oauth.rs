//! Google OAuth2 authorization-code flow.
//!
//! Thin HTTP wrapper around the authorization and token endpoints. The
//! request/response shaping (`parse_token_response`, `authorization_code`,
//! `check_transport`) is pure so it can be tested without a provider.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ChannelConfig;

/// The only scope requested: read-only access to the account's broadcasts.
pub const SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

// =============================================================================
// TYPES
// =============================================================================

/// Token set stored in a browser session after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    /// Unix time (seconds) after which `token` is no longer valid.
    pub expires_at: Option<i64>,
}

impl Credentials {
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now + EXPIRY_SKEW_SECS >= expires_at)
    }

    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthExchangeError {
    #[error("channel is not configured")]
    NotConfigured,
    #[error("authorization denied by provider: {0}")]
    Denied(String),
    #[error("callback is missing the authorization code")]
    MissingCode,
    #[error("oauth state mismatch")]
    StateMismatch,
    #[error("insecure transport: redirect uri {0} is not https")]
    InsecureTransport(String),
    #[error("invalid oauth endpoint url: {0}")]
    InvalidUrl(String),
    #[error("token request failed: {0}")]
    Request(String),
    #[error("token endpoint rejected request: status {status}")]
    Rejected { status: u16, body: String },
    #[error("token response parse failed: {0}")]
    Parse(String),
    #[error("credentials carry no refresh token")]
    NoRefreshToken,
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Current unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct OAuthClient {
    http: reqwest::Client,
    auth_url: String,
    token_url: String,
}

impl OAuthClient {
    /// Build a client for the given authorization and token endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(auth_url: impl Into<String>, token_url: impl Into<String>) -> Result<Self, AuthExchangeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthExchangeError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, auth_url: auth_url.into(), token_url: token_url.into() })
    }

    /// Provider URL the browser is sent to at login. Always forces consent
    /// and asks for offline access so a refresh token is issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a URL.
    pub fn authorization_url(
        &self,
        config: &ChannelConfig,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, AuthExchangeError> {
        let url = reqwest::Url::parse_with_params(
            &self.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", SCOPE),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AuthExchangeError::InvalidUrl(e.to_string()))?;
        Ok(url.to_string())
    }

    /// Exchange an authorization code for a token set.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the provider rejects the code.
    pub async fn exchange_code(
        &self,
        config: &ChannelConfig,
        redirect_uri: &str,
        code: &str,
    ) -> Result<Credentials, AuthExchangeError> {
        let text = self
            .send_form(
                &self.token_url,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", redirect_uri),
                    ("client_id", config.client_id.as_str()),
                    ("client_secret", config.client_secret.as_str()),
                ],
            )
            .await?;
        let resp = parse_token_response(&text)?;
        Ok(credentials_from_response(
            resp,
            &config.client_id,
            &config.client_secret,
            &self.token_url,
            None,
            unix_now(),
        ))
    }

    /// Obtain a fresh access token using the stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no refresh token or the provider refuses it.
    pub async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, AuthExchangeError> {
        let Some(refresh_token) = credentials.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
            return Err(AuthExchangeError::NoRefreshToken);
        };
        let text = self
            .send_form(
                &credentials.token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", credentials.client_id.as_str()),
                    ("client_secret", credentials.client_secret.as_str()),
                ],
            )
            .await?;
        let resp = parse_token_response(&text)?;
        Ok(credentials_from_response(
            resp,
            &credentials.client_id,
            &credentials.client_secret,
            &credentials.token_uri,
            Some(credentials),
            unix_now(),
        ))
    }

    async fn send_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, AuthExchangeError> {
        let response = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| AuthExchangeError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AuthExchangeError::Request(e.to_string()))?;
        if status != 200 {
            return Err(AuthExchangeError::Rejected { status, body: text });
        }
        Ok(text)
    }
}

/// Validate the callback and complete the exchange.
///
/// `expected_state` is the anti-CSRF value issued at `/login`.
///
/// # Errors
///
/// Returns an error if the channel is unconfigured, the callback is invalid,
/// transport security is violated, or the provider rejects the code.
pub async fn complete_authorization(
    client: &OAuthClient,
    config: Option<&ChannelConfig>,
    redirect_uri: &str,
    callback: &CallbackQuery,
    expected_state: Option<&str>,
    allow_insecure: bool,
) -> Result<Credentials, AuthExchangeError> {
    let config = config.ok_or(AuthExchangeError::NotConfigured)?;
    check_transport(redirect_uri, allow_insecure)?;
    let code = authorization_code(callback, expected_state)?;
    client.exchange_code(config, redirect_uri, code).await
}

// =============================================================================
// PURE HELPERS
// =============================================================================

/// Reject plain-http redirect URIs unless insecure transport is allowed.
pub fn check_transport(redirect_uri: &str, allow_insecure: bool) -> Result<(), AuthExchangeError> {
    if allow_insecure || redirect_uri.starts_with("https://") {
        Ok(())
    } else {
        Err(AuthExchangeError::InsecureTransport(redirect_uri.to_string()))
    }
}

/// Extract the authorization code after checking the provider error and state.
pub fn authorization_code<'a>(
    callback: &'a CallbackQuery,
    expected_state: Option<&str>,
) -> Result<&'a str, AuthExchangeError> {
    if let Some(error) = &callback.error {
        return Err(AuthExchangeError::Denied(error.clone()));
    }
    let expected = expected_state.unwrap_or_default();
    if expected.is_empty() || callback.state.as_deref() != Some(expected) {
        return Err(AuthExchangeError::StateMismatch);
    }
    callback
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(AuthExchangeError::MissingCode)
}

fn parse_token_response(text: &str) -> Result<TokenResponse, AuthExchangeError> {
    serde_json::from_str(text).map_err(|_| AuthExchangeError::Parse(format!("unexpected response: {text}")))
}

/// Build credentials from a token response. Fields the provider omits on
/// refresh (refresh token, scopes) are carried over from `previous`.
fn credentials_from_response(
    resp: TokenResponse,
    client_id: &str,
    client_secret: &str,
    token_uri: &str,
    previous: Option<&Credentials>,
    now: i64,
) -> Credentials {
    let scopes = match resp.scope.as_deref() {
        Some(scope) if !scope.trim().is_empty() => scope.split_whitespace().map(str::to_string).collect(),
        _ => previous.map_or_else(|| vec![SCOPE.to_string()], |p| p.scopes.clone()),
    };
    Credentials {
        token: resp.access_token,
        refresh_token: resp
            .refresh_token
            .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
        token_uri: token_uri.to_string(),
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
        scopes,
        expires_at: resp.expires_in.map(|secs| now.saturating_add(secs)),
    }
}

#[cfg(test)]
#[path = "oauth_test.rs"]
mod tests;
