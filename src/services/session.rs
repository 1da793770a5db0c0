//! Per-browser session storage.
//!
//! ARCHITECTURE
//! ============
//! The browser holds an opaque random token in the `session_token` cookie;
//! the server maps it to the OAuth [`Credentials`] obtained at login. The map
//! lives in process memory only: tokens never touch the database, and a
//! restart logs everyone out.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::RwLock;

use super::oauth::Credentials;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Session token → credentials, shared across handlers.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Credentials>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for the given credentials, returning its token.
    pub async fn create(&self, credentials: Credentials) -> String {
        let token = generate_token();
        self.inner.write().await.insert(token.clone(), credentials);
        token
    }

    /// Credentials for a session token, if the session exists.
    pub async fn get(&self, token: &str) -> Option<Credentials> {
        self.inner.read().await.get(token).cloned()
    }

    /// Replace the credentials of an existing session (after a token refresh).
    /// Returns `false` if the session was removed in the meantime.
    pub async fn update(&self, token: &str, credentials: Credentials) -> bool {
        match self.inner.write().await.get_mut(token) {
            Some(slot) => {
                *slot = credentials;
                true
            }
            None => false,
        }
    }

    /// Drop a session. Unknown tokens are ignored.
    pub async fn remove(&self, token: &str) {
        self.inner.write().await.remove(token);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
