use crate::config::{Config, StoreConfig};
use crate::debounce::spawn_debouncer;
use crate::pipeline::{Pipeline, ViewState};
use crate::store::{AppwriteStore, MemoryStore, PopularityStore};
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    /// Latest raw search input, fed to the debouncer.
    pub search_input: Arc<watch::Sender<String>>,
    pub view: watch::Receiver<ViewState>,
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    term: String,
}

pub async fn run_server(config: &Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(&config.tmdb)?);
    let store: Arc<dyn PopularityStore> = match &config.store {
        StoreConfig::Appwrite(aw) => {
            info!("Recording popularity in Appwrite collection {}", aw.collection_id);
            Arc::new(AppwriteStore::new(aw)?)
        }
        StoreConfig::Memory => {
            info!("Recording popularity in process memory");
            Arc::new(MemoryStore::new())
        }
    };

    let state = start(config, tmdb, store);
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Wires debouncer and pipeline together, loads the trending snapshot once and kicks
/// off the startup (discover) query.
pub fn start(
    config: &Config,
    tmdb: Arc<dyn TmdbApi>,
    store: Arc<dyn PopularityStore>,
) -> AppState {
    let pipeline = Arc::new(Pipeline::new(tmdb, store));
    let view = pipeline.subscribe();

    let (input_tx, input_rx) = watch::channel(String::new());
    let (committed_rx, _debouncer) = spawn_debouncer(config.debounce, input_rx);

    let trending = pipeline.clone();
    let limit = config.trending_limit;
    tokio::spawn(async move { trending.load_trending(limit).await });
    tokio::spawn(pipeline.run(committed_rx));

    AppState {
        search_input: Arc::new(input_tx),
        view,
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/search", post(handle_search))
        .route("/state", get(current_state))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn handle_search(
    State(state): State<AppState>,
    Json(input): Json<SearchInput>,
) -> StatusCode {
    debug!(term = %input.term, "Search input received");
    state.search_input.send_replace(input.term);
    StatusCode::ACCEPTED
}

async fn current_state(State(state): State<AppState>) -> Json<ViewState> {
    Json(state.view.borrow().clone())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
