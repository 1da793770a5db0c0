//! Process settings parsed from environment variables.
//!
//! Channel credentials are not read here; they live in the config document
//! managed by [`crate::config::ConfigStore`] and are entered through `/setup`.

use tracing_subscriber::EnvFilter;

use crate::services::fetcher::ContentFilter;

pub const DEFAULT_LOG_DIRECTIVES: &str = "info";
pub const DEFAULT_PORT: u16 = 5003;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:chat_archive.db?mode=rwc";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_FILTER_MARKER: &str = "Æ";
pub const DEFAULT_YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_OAUTH_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub database_url: String,
    pub config_path: String,
    /// External base URL (scheme + host) used to build the OAuth redirect URI.
    /// Derived from request headers when absent.
    pub public_base_url: Option<String>,
    /// Accept plain-http redirect URIs during the OAuth exchange.
    pub insecure_transport: bool,
    pub cookie_secure: bool,
    pub filter: ContentFilter,
    pub youtube_api_base_url: String,
    pub oauth_auth_url: String,
    pub oauth_token_url: String,
}

impl Settings {
    /// Build typed settings from environment variables.
    ///
    /// All variables are optional:
    /// - `PORT`: default 5003
    /// - `DATABASE_URL`: default `sqlite:chat_archive.db?mode=rwc`
    /// - `CONFIG_PATH`: default `config.json`
    /// - `PUBLIC_BASE_URL`: unset
    /// - `OAUTHLIB_INSECURE_TRANSPORT`: default true
    /// - `COOKIE_SECURE`: inferred from `PUBLIC_BASE_URL`
    /// - `CHAT_FILTER_ENABLED`: default false
    /// - `CHAT_FILTER_MARKER`: default `Æ`
    /// - `YOUTUBE_API_BASE_URL`, `OAUTH_AUTH_URL`, `OAUTH_TOKEN_URL`: Google endpoints
    #[must_use]
    pub fn from_env() -> Self {
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or_else(|| {
            public_base_url
                .as_deref()
                .is_some_and(|url| url.starts_with("https://"))
        });

        let filter = if env_bool("CHAT_FILTER_ENABLED").unwrap_or(false) {
            let marker = std::env::var("CHAT_FILTER_MARKER")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER_MARKER.to_string());
            ContentFilter::marker(marker)
        } else {
            ContentFilter::disabled()
        };

        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            database_url: env_string("DATABASE_URL", DEFAULT_DATABASE_URL),
            config_path: env_string("CONFIG_PATH", DEFAULT_CONFIG_PATH),
            public_base_url,
            insecure_transport: env_bool("OAUTHLIB_INSECURE_TRANSPORT").unwrap_or(true),
            cookie_secure,
            filter,
            youtube_api_base_url: env_url("YOUTUBE_API_BASE_URL", DEFAULT_YOUTUBE_API_BASE_URL),
            oauth_auth_url: env_url("OAUTH_AUTH_URL", DEFAULT_OAUTH_AUTH_URL),
            oauth_token_url: env_url("OAUTH_TOKEN_URL", DEFAULT_OAUTH_TOKEN_URL),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            public_base_url: None,
            insecure_transport: true,
            cookie_secure: false,
            filter: ContentFilter::disabled(),
            youtube_api_base_url: DEFAULT_YOUTUBE_API_BASE_URL.to_string(),
            oauth_auth_url: DEFAULT_OAUTH_AUTH_URL.to_string(),
            oauth_token_url: DEFAULT_OAUTH_TOKEN_URL.to_string(),
        }
    }
}

/// Log filter from `RUST_LOG` directives. Unset or unparsable falls back to
/// `info`, so per-message debug lines need e.g. `RUST_LOG=chat_archive=debug`.
#[must_use]
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_url(key: &str, default: &str) -> String {
    env_string(key, default).trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
