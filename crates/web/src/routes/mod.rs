use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use game_review_core::review::analyze_pgn_cancellable;
use game_review_core::{AnalysisReport, Error, ErrorKind, SearchParams};

use crate::pool::EnginePool;
use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Analysis(#[from] Error),

    #[error("Analysis did not finish in time")]
    Timeout,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            AppError::Analysis(e) => match e.kind() {
                ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, ErrorKind::InvalidInput),
                ErrorKind::OracleFailure => {
                    (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::OracleFailure)
                }
                ErrorKind::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Cancelled),
                ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal),
            },
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, ErrorKind::OracleFailure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal),
        };

        if status.is_server_error() {
            error!(%self, "analysis request failed");
        }

        let body = json!({ "ok": false, "kind": kind, "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    /// Full PGN of the game to analyze
    pub pgn: String,
    pub depth: Option<u32>,
    pub multipv: Option<u32>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub ok: bool,
    pub report: AnalysisReport,
}

/// Raises the flag when the request future is dropped
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn request_params(req: &AnalyzeRequest, defaults: SearchParams) -> Result<SearchParams, Error> {
    let narrow = |name: &str, value: u32| {
        u8::try_from(value)
            .map_err(|_| Error::InvalidInput(format!("{} is out of range: {}", name, value)))
    };
    let depth = match req.depth {
        Some(d) => narrow("depth", d)?,
        None => defaults.depth,
    };
    let lines = match req.multipv {
        Some(m) => narrow("multipv", m)?,
        None => defaults.lines,
    };
    SearchParams::new(depth, lines)
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| Error::InvalidInput(rejection.body_text()))?;
    let params = request_params(&req, state.config.default_params)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let _guard = CancelOnDrop(Arc::clone(&cancel));

    // The limit covers waiting for a free engine as well as the analysis
    let work = run_analysis(Arc::clone(&state.pool), req.pgn, params, cancel);
    let report = match state.config.analysis_timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| AppError::Timeout)??,
        None => work.await?,
    };

    info!(moves = report.moves.len(), "analysis served");
    Ok(Json(AnalyzeResponse { ok: true, report }))
}

async fn run_analysis(
    pool: Arc<EnginePool>,
    pgn: String,
    params: SearchParams,
    cancel: Arc<AtomicBool>,
) -> Result<AnalysisReport, AppError> {
    let mut lease = pool
        .acquire()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let task = tokio::task::spawn_blocking(move || {
        let result = match lease.session() {
            Ok(session) => analyze_pgn_cancellable(session, &pgn, params, &cancel),
            Err(e) => Err(Error::from(e)),
        };
        if matches!(result, Err(Error::Oracle(_))) {
            lease.discard();
        }
        result
    });

    let report = task.await.map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(report)
}

pub async fn health() -> &'static str {
    "OK"
}
