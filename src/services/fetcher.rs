//! Live-chat fetcher: active broadcast lookup, one page of messages, archive.
//!
//! DESIGN
//! ======
//! Each call reads only the newest page (at most [`MAX_RESULTS`] items) of
//! the active broadcast's chat. Messages that scroll past between two calls
//! are never seen; there is no pagination loop and no background polling.
//! Every accepted item is upserted, so overlapping pages are harmless.
//!
//! ERROR HANDLING
//! ==============
//! `try_*` functions return a [`FetchError`] that names the cause. The plain
//! wrappers used by the HTTP surface log it and collapse to `None` / an empty
//! batch, which is all a caller of `/fetch_comments` ever sees.

use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use super::archive::{self, ChatMessage};
use super::oauth::Credentials;
use super::youtube::{ChatApiError, LiveChatApi, LiveChatItem};

/// Page size requested from `liveChat/messages`.
pub const MAX_RESULTS: u32 = 20;

// =============================================================================
// CONTENT FILTER
// =============================================================================

/// Decides which chat items are archived. Disabled means pass-through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    marker: Option<String>,
}

impl ContentFilter {
    #[must_use]
    pub fn disabled() -> Self {
        Self { marker: None }
    }

    /// Only accept messages containing `marker`.
    #[must_use]
    pub fn marker(marker: impl Into<String>) -> Self {
        Self { marker: Some(marker.into()) }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.marker.is_some()
    }

    #[must_use]
    pub fn accepts(&self, message: &str) -> bool {
        self.marker
            .as_deref()
            .is_none_or(|marker| message.contains(marker))
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no credentials in session")]
    MissingCredentials,
    #[error("no active broadcast")]
    NoActiveBroadcast,
    #[error("authorization expired or revoked: {0}")]
    AuthorizationExpired(ChatApiError),
    #[error("live chat api error: {0}")]
    Api(ChatApiError),
    #[error("archive write failed: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<ChatApiError> for FetchError {
    fn from(e: ChatApiError) -> Self {
        match e {
            ChatApiError::NoActiveBroadcast => Self::NoActiveBroadcast,
            ChatApiError::Unauthorized { .. } => Self::AuthorizationExpired(e),
            other => Self::Api(other),
        }
    }
}

// =============================================================================
// ACTIVE BROADCAST
// =============================================================================

/// Chat-room id of the active broadcast.
///
/// # Errors
///
/// Returns [`FetchError::NoActiveBroadcast`] when nothing is live, or the
/// underlying API failure.
pub async fn try_find_active_broadcast_chat_id(
    api: &dyn LiveChatApi,
    credentials: &Credentials,
) -> Result<String, FetchError> {
    Ok(api.active_live_chat_id(&credentials.token).await?)
}

/// Like [`try_find_active_broadcast_chat_id`], but logs and returns `None` on
/// any failure. Request handlers go through [`fetch_recent_messages`], which
/// needs the error to decide what to log.
#[cfg(test)]
pub async fn find_active_broadcast_chat_id(api: &dyn LiveChatApi, credentials: &Credentials) -> Option<String> {
    match try_find_active_broadcast_chat_id(api, credentials).await {
        Ok(id) => Some(id),
        Err(e) => {
            log_fetch_error(&e);
            None
        }
    }
}

// =============================================================================
// FETCH
// =============================================================================

/// Fetch the newest page of the active chat, archive accepted items, and
/// return them in provider order.
///
/// # Errors
///
/// Returns an error if the session has no credentials, nothing is live, the
/// API call fails, or an archive write fails.
pub async fn try_fetch_recent_messages(
    api: &dyn LiveChatApi,
    pool: &SqlitePool,
    filter: &ContentFilter,
    credentials: Option<&Credentials>,
) -> Result<Vec<ChatMessage>, FetchError> {
    let credentials = credentials.ok_or(FetchError::MissingCredentials)?;
    let live_chat_id = try_find_active_broadcast_chat_id(api, credentials).await?;
    let items = api
        .list_messages(&credentials.token, &live_chat_id, MAX_RESULTS)
        .await?;

    let received = items.len();
    let mut batch = Vec::with_capacity(received);
    let mut inserted = 0usize;
    for item in items {
        if !filter.accepts(&item.message) {
            continue;
        }
        let message = chat_message(item);
        debug!(author = %message.author, message = %message.message, "archiving chat message");
        if archive::upsert(pool, &message).await? {
            inserted += 1;
        }
        batch.push(message);
    }

    info!(received, accepted = batch.len(), inserted, "live chat fetched");
    Ok(batch)
}

/// Like [`try_fetch_recent_messages`], but logs and returns an empty batch on
/// any failure.
pub async fn fetch_recent_messages(
    api: &dyn LiveChatApi,
    pool: &SqlitePool,
    filter: &ContentFilter,
    credentials: Option<&Credentials>,
) -> Vec<ChatMessage> {
    match try_fetch_recent_messages(api, pool, filter, credentials).await {
        Ok(batch) => batch,
        Err(e) => {
            log_fetch_error(&e);
            Vec::new()
        }
    }
}

fn chat_message(item: LiveChatItem) -> ChatMessage {
    ChatMessage { id: item.id, author: item.author, message: item.message, timestamp: item.published_at }
}

fn log_fetch_error(e: &FetchError) {
    match e {
        FetchError::MissingCredentials => warn!("no oauth credentials in session; log in first"),
        FetchError::NoActiveBroadcast => warn!("no active live broadcast found"),
        FetchError::AuthorizationExpired(_) => warn!(error = %e, "live chat authorization rejected"),
        FetchError::Api(_) | FetchError::Storage(_) => error!(error = %e, "live chat fetch failed"),
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
