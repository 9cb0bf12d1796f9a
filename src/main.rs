//! Bucket sorting backend entrypoint wiring REST, SSE, session storage and the results webhook.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use bucket_sort_back::{
    config::AppConfig,
    dao::kv_store::{self, FileKvStore, KeyValueStore, MemoryKvStore},
    routes,
    services::submission::{SubmissionClient, WebhookSink},
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();

    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => {
            info!(path = %path.display(), "persisting session keys to file");
            Arc::new(FileKvStore::new(path))
        }
        None => Arc::new(MemoryKvStore::new()),
    };

    let recovered = kv_store::load_session(store.as_ref()).await;
    if let Some(session) = &recovered {
        warn!(email = %session.email, "previous session was never reset; starting at email entry");
    }

    let sink = WebhookSink::new(config.webhook.endpoint.clone(), config.webhook.timeout)
        .context("building webhook client")?;
    let submissions = SubmissionClient::new(Arc::new(sink), config.webhook.template.clone());

    let app_state = AppState::new(config, store, submissions, recovered);

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
