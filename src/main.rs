//! Caption Clash Back binary entrypoint wiring the REST surface, the phase timer and the round store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caption_clash_back::{
    config::AppConfig,
    dao::round_store::{RoundStore, memory::MemoryRoundStore},
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = select_store().await?;
    let app_state = AppState::new(store, config);

    // Bootstrap the first round (or pick up the persisted one) and start its timer.
    let round = app_state
        .engine()
        .current_round()
        .await
        .context("loading current round")?;
    info!(round_id = round.id, phase = ?round.status, "current round ready");
    app_state.timer().arm(&round).await;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

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

    app_state.timer().disarm().await;
    Ok(())
}

/// Pick the round store named by `ROUND_STORE` (`memory` unless told otherwise).
async fn select_store() -> anyhow::Result<Arc<dyn RoundStore>> {
    let backend = env::var("ROUND_STORE").unwrap_or_else(|_| "memory".into());
    match backend.as_str() {
        "memory" => {
            info!("using in-memory round store; state is lost on restart");
            Ok(Arc::new(MemoryRoundStore::new()))
        }
        #[cfg(feature = "couch-store")]
        "couchdb" => connect_couch().await,
        other => anyhow::bail!("unsupported ROUND_STORE backend: {other}"),
    }
}

/// Connect to CouchDB, retrying with exponential backoff a bounded number of times.
#[cfg(feature = "couch-store")]
async fn connect_couch() -> anyhow::Result<Arc<dyn RoundStore>> {
    use std::time::Duration;

    use caption_clash_back::dao::round_store::couchdb::{CouchConfig, CouchRoundStore};
    use tokio::time::sleep;

    const MAX_ATTEMPTS: u32 = 5;
    let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
    let mut delay = Duration::from_millis(1000);
    let max_delay = Duration::from_secs(10);

    let mut attempt = 1;
    loop {
        match CouchRoundStore::connect(config.clone()).await {
            Ok(store) => {
                info!(database = %config.database, "connected to CouchDB");
                return Ok(Arc::new(store));
            }
            Err(err) if attempt < MAX_ATTEMPTS => {
                warn!(error = %err, attempt, "CouchDB connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(max_delay);
                attempt += 1;
            }
            Err(err) => {
                return Err(err).context(format!("connecting to CouchDB after {attempt} attempts"));
            }
        }
    }
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

        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
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
