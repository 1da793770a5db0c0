//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! owns everything a request may touch: the archive pool, the channel config
//! store, the in-memory session map, the OAuth and live-chat clients, and the
//! compiled page templates.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ConfigStore;
use crate::pages::Pages;
use crate::services::fetcher::ContentFilter;
use crate::services::oauth::OAuthClient;
use crate::services::session::SessionStore;
use crate::services::youtube::LiveChatApi;

/// Request-facing subset of [`crate::settings::Settings`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpOptions {
    pub public_base_url: Option<String>,
    pub insecure_transport: bool,
    pub cookie_secure: bool,
    pub filter: ContentFilter,
}

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: ConfigStore,
    pub sessions: SessionStore,
    pub oauth: Arc<OAuthClient>,
    pub chat_api: Arc<dyn LiveChatApi>,
    pub pages: Pages,
    pub options: Arc<HttpOptions>,
}

impl AppState {
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        config: ConfigStore,
        oauth: OAuthClient,
        chat_api: Arc<dyn LiveChatApi>,
        pages: Pages,
        options: HttpOptions,
    ) -> Self {
        Self {
            pool,
            config,
            sessions: SessionStore::new(),
            oauth: Arc::new(oauth),
            chat_api,
            pages,
            options: Arc::new(options),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
