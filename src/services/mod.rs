//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the OAuth exchange, the live-chat API client, and the
//! archive table so route handlers can stay focused on redirects, cookies,
//! and rendering.

pub mod archive;
pub mod fetcher;
pub mod oauth;
pub mod session;
pub mod youtube;
