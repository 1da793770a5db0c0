mod config;
mod db;
mod pages;
mod routes;
mod services;
mod settings;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(settings::log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let settings = settings::Settings::from_env();

    let pool = db::init_pool(&settings.database_url)
        .await
        .expect("database init failed");

    // A broken config file is not fatal: the app starts unconfigured and
    // `/setup` overwrites it.
    let config = match config::ConfigStore::open(&settings.config_path).await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "config unreadable; starting unconfigured");
            config::ConfigStore::new(&settings.config_path, None)
        }
    };
    if config.is_configured().await {
        tracing::info!(path = %settings.config_path, "channel configuration loaded");
    } else {
        tracing::info!(path = %settings.config_path, "no channel configuration; visit /setup");
    }

    let oauth = services::oauth::OAuthClient::new(&settings.oauth_auth_url, &settings.oauth_token_url)
        .expect("oauth client init failed");
    let chat_api =
        services::youtube::YouTubeClient::new(&settings.youtube_api_base_url).expect("youtube client init failed");
    let pages = pages::Pages::new().expect("template compilation failed");

    if settings.insecure_transport {
        tracing::warn!("OAUTHLIB_INSECURE_TRANSPORT enabled; plain-http OAuth redirects accepted");
    }
    tracing::info!(filter_enabled = settings.filter.is_enabled(), "content filter configured");

    let options = state::HttpOptions {
        public_base_url: settings.public_base_url.clone(),
        insecure_transport: settings.insecure_transport,
        cookie_secure: settings.cookie_secure,
        filter: settings.filter.clone(),
    };
    let state = state::AppState::new(pool, config, oauth, Arc::new(chat_api), pages, options);

    let app = routes::app(state);
    let port = settings.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "chat archive listening");
    axum::serve(listener, app).await.expect("server failed");
}
