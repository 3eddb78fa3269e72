use std::process;
use std::sync::Arc;

use game_review_core::StockfishEngine;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;
use crate::pool::{EnginePool, OracleSession, SessionFactory};

mod config;
mod pool;
mod routes;

pub struct AppState {
    pub config: ServiceConfig,
    pub pool: Arc<EnginePool>,
}

fn stockfish_factory(config: &ServiceConfig) -> SessionFactory {
    let path = config.stockfish_path.clone();
    let options = config.engine_options();
    Arc::new(move || {
        let mut engine = StockfishEngine::new(&path)?;
        engine.configure(&options)?;
        Ok(Box::new(engine) as OracleSession)
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            process::exit(1);
        }
    };

    info!(
        stockfish = %config.stockfish_path,
        pool_size = config.pool_size,
        depth = config.default_params.depth,
        multipv = config.default_params.lines,
        "starting game review service"
    );

    let pool = EnginePool::new(config.pool_size, stockfish_factory(&config));
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        config,
        pool: Arc::clone(&pool),
    });

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", bind_addr, e);
            process::exit(1);
        }
    };

    info!("listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {}", e);
    }

    pool.close_idle();
}
