//! Health-only HTTP facade over the transaction lifecycle engine.
//!
//! Grounded in the teacher's `main.rs` shape — build a shared `Arc` state,
//! wrap the router in `TraceLayer`/`CorsLayer`, bind, and shut down
//! gracefully on Ctrl-C — narrowed to the single REST surface `spec.md` §6
//! actually describes: a health snapshot endpoint keyed by chain. The rest
//! of the engine (submission, resubmission, the Lifecycle Scheduler) is a
//! library surface meant to be embedded by callers, not exposed as a
//! process boundary here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use txrelay::chain_adapter::ChainAdapter;
use txrelay::chain_id::ChainFamily;
use txrelay::config::Config;
use txrelay::evm::EvmAdapter;
use txrelay::health::{self, HealthRegistry};
use txrelay::registry::ChainRegistry;
use txrelay::stub::StubAdapter;
use txrelay::telemetry;

struct AppState {
    chains: Arc<ChainRegistry>,
    health_registry: Arc<HealthRegistry>,
    health_concurrency: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    telemetry::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let chains = Arc::new(ChainRegistry::new());
    let health_registry = Arc::new(HealthRegistry::new());

    if let Err(err) = initialize_chains(&config, &chains, &health_registry).await {
        tracing::error!(error = %err, "failed to initialize chain adapters");
        return ExitCode::FAILURE;
    }

    let state = Arc::new(AppState {
        chains,
        health_registry,
        health_concurrency: config.health_concurrency(),
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::new(config.host(), config.port());
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, %addr, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, "txrelay-health listening");
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server exited with an error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Builds one [`ChainAdapter`] per configured chain and registers it for
/// both submission (`ChainRegistry`) and health probing (`HealthRegistry`).
/// Non-EVM chains are registered with [`StubAdapter`] so they still surface
/// in the health endpoint, matching the Open Question resolution recorded
/// in `DESIGN.md`: the stub is reachable for reads, never for writes.
async fn initialize_chains(
    config: &Config,
    chains: &ChainRegistry,
    health_registry: &HealthRegistry,
) -> Result<(), txrelay::error::TxRelayError> {
    for (chain_id, entry) in config.chains() {
        let chain_id = *chain_id;
        let primary = entry.primary_endpoints();
        let fallback = entry.fallback_endpoints();
        let all_endpoints: Vec<_> = primary.iter().chain(fallback.iter()).cloned().collect();

        let adapter: Arc<dyn ChainAdapter> = match chain_id.family() {
            ChainFamily::Evm => Arc::new(
                EvmAdapter::initialize(
                    chain_id,
                    primary,
                    fallback,
                    entry.avg_block_time(),
                    entry.required_confirmations,
                    entry.network_id,
                    entry.default_private_key.inner(),
                    Some(entry.connect_timeout()),
                    config.abi_root(),
                )
                .await?,
            ),
            ChainFamily::NonEvm => Arc::new(StubAdapter::new(chain_id)),
        };

        health_registry.register(chain_id, all_endpoints, Some(entry.connect_timeout()));
        chains.initialize(adapter);
        tracing::info!(chain = %chain_id, "registered chain adapter");
    }
    Ok(())
}

/// `GET /health` — a snapshot of every registered chain's node pool,
/// keyed by the chain's pascal-case name. Returns `200` on success and
/// `500` when no chain has been registered, matching `spec.md` §6.
async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    match health::check_health(&state.health_registry, &state.chains, state.health_concurrency).await
    {
        Ok(snapshot) => {
            let body: Value = snapshot
                .into_iter()
                .map(|(chain, health)| (chain.name_in_pascal_case().to_string(), json!(health)))
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
    tokio::time::sleep(Duration::from_millis(50)).await;
}
