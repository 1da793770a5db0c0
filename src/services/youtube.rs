//! YouTube Data API v3 client: live broadcasts and live-chat messages.
//!
//! Only the two calls the archive needs. Parsing is split into pure
//! functions (`parse_active_chat_id`, `parse_chat_items`) for testability.

use std::time::Duration;

use serde::Deserialize;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// TYPES
// =============================================================================

/// Errors from the live-chat API. Kept distinct so callers can tell an
/// offline channel from a revoked token or a network failure.
#[derive(Debug, thiserror::Error)]
pub enum ChatApiError {
    /// The channel has no broadcast in `active` state.
    #[error("no active broadcast")]
    NoActiveBroadcast,

    /// The provider refused the access token.
    #[error("authorization rejected: status {status}")]
    Unauthorized { status: u16, body: String },

    /// The HTTP request could not be completed.
    #[error("API request failed: {0}")]
    Transport(String),

    /// The provider returned another non-success status (quota, bad request).
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("API response parse failed: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// One chat item as returned by `liveChat/messages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveChatItem {
    pub id: String,
    pub author: String,
    pub message: String,
    pub published_at: String,
}

/// Live-chat API seam. Implemented by [`YouTubeClient`] and by test mocks.
#[async_trait::async_trait]
pub trait LiveChatApi: Send + Sync {
    /// Chat-room id of the first active broadcast.
    async fn active_live_chat_id(&self, access_token: &str) -> Result<String, ChatApiError>;

    /// Up to `max_results` most recent items of a chat room.
    async fn list_messages(
        &self,
        access_token: &str,
        live_chat_id: &str,
        max_results: u32,
    ) -> Result<Vec<LiveChatItem>, ChatApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
}

impl YouTubeClient {
    /// Build a client against `base_url` (normally `https://www.googleapis.com/youtube/v3`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ChatApiError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    async fn get(&self, path: &str, access_token: &str, query: &[(&str, &str)]) -> Result<String, ChatApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| ChatApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ChatApiError::Transport(e.to_string()))?;
        match status {
            200 => Ok(text),
            401 => Err(ChatApiError::Unauthorized { status, body: text }),
            _ => Err(ChatApiError::ApiResponse { status, body: text }),
        }
    }
}

#[async_trait::async_trait]
impl LiveChatApi for YouTubeClient {
    async fn active_live_chat_id(&self, access_token: &str) -> Result<String, ChatApiError> {
        let text = self
            .get(
                "/liveBroadcasts",
                access_token,
                &[("part", "snippet"), ("broadcastStatus", "active"), ("broadcastType", "all")],
            )
            .await?;
        parse_active_chat_id(&text)
    }

    async fn list_messages(
        &self,
        access_token: &str,
        live_chat_id: &str,
        max_results: u32,
    ) -> Result<Vec<LiveChatItem>, ChatApiError> {
        let max_results = max_results.to_string();
        let text = self
            .get(
                "/liveChat/messages",
                access_token,
                &[
                    ("liveChatId", live_chat_id),
                    ("part", "snippet,authorDetails"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;
        parse_chat_items(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct Broadcast {
    snippet: BroadcastSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastSnippet {
    #[serde(default)]
    live_chat_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatItem {
    id: String,
    snippet: ChatSnippet,
    author_details: AuthorDetails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatSnippet {
    /// Absent for some event types (e.g. deleted messages).
    #[serde(default)]
    display_message: String,
    published_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorDetails {
    display_name: String,
}

/// First active broadcast's chat id. A broadcast without chat counts as none.
pub fn parse_active_chat_id(text: &str) -> Result<String, ChatApiError> {
    let resp: ListResponse<Broadcast> =
        serde_json::from_str(text).map_err(|e| ChatApiError::Parse(e.to_string()))?;
    resp.items
        .into_iter()
        .next()
        .and_then(|b| b.snippet.live_chat_id)
        .filter(|id| !id.is_empty())
        .ok_or(ChatApiError::NoActiveBroadcast)
}

/// Decode a `liveChat/messages` page, preserving the provider's order.
pub fn parse_chat_items(text: &str) -> Result<Vec<LiveChatItem>, ChatApiError> {
    let resp: ListResponse<ChatItem> = serde_json::from_str(text).map_err(|e| ChatApiError::Parse(e.to_string()))?;
    Ok(resp
        .items
        .into_iter()
        .map(|item| LiveChatItem {
            id: item.id,
            author: item.author_details.display_name,
            message: item.snippet.display_message,
            published_at: item.snippet.published_at,
        })
        .collect())
}

#[cfg(test)]
#[path = "youtube_test.rs"]
mod tests;
