//! OmniSense - streaming persona chat backend
//!
//! Serves a browser chat front end: composes persona-driven requests to the
//! Gemini API, streams incremental response text back over SSE, and keeps
//! conversation history and settings in a local SQLite store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod core;
mod modes;
mod providers;
mod render;
mod routes;

use self::config::Config;
use self::core::{ChatEngine, KvStore, Session, Settings};
use self::providers::gemini::GeminiProvider;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: ChatEngine,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omnisense=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let store = Arc::new(KvStore::new(&config.data_dir.join("omnisense.db")).await?);

    // Restore persisted state once at startup; anything corrupt or missing
    // falls back to defaults.
    let conversation = store.load_history().await?;
    let settings = store
        .load_settings()
        .await?
        .map(|persisted| persisted.into_settings())
        .unwrap_or_else(Settings::default);
    tracing::info!(messages = conversation.len(), "restored session state");

    let api_key = config.gemini_api_key.clone().unwrap_or_else(|| {
        tracing::warn!("no Gemini API key configured; provider calls will fail");
        String::new()
    });
    let mut provider = GeminiProvider::new(api_key);
    if let Some(ref base_url) = config.gemini_base_url {
        provider = provider.with_base_url(base_url.clone());
    }

    let engine = ChatEngine::new(
        Arc::new(provider),
        store,
        Session::new(conversation, settings),
    );

    let state = AppState { config, engine };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("🔮 OmniSense API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
