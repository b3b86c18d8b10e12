mod payload;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::{
    MonteCarloSimulator, ProjectionParams, ReturnStatistics, SimulationError, SimulationResult,
    YearlyResult, invested_amount, project,
};

pub use payload::{
    DEFAULT_SIMULATIONS, MAX_SIMULATIONS, MAX_YEARS, ProjectPayload, SimulatePayload,
    SimulateRequest, default_projection_params, default_simulation_params,
    projection_params_from_payload, simulate_request_from_payload,
};

/// Shared server state. Statistics are loaded once at startup; `None` means the
/// price file could not be loaded and simulations are unavailable.
#[derive(Clone)]
pub struct AppState {
    stats: Option<Arc<ReturnStatistics>>,
    simulator: Arc<MonteCarloSimulator>,
}

impl AppState {
    pub fn new(stats: Option<ReturnStatistics>) -> Self {
        Self {
            stats: stats.map(Arc::new),
            simulator: Arc::new(MonteCarloSimulator::new()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub years: Vec<YearlyResult>,
    pub invested_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub horizon_years: u32,
    pub simulations: u32,
    pub statistics: ReturnStatistics,
    pub result: SimulationResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressResponse {
    running: bool,
    progress: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/project", post(project_handler))
        .route("/api/simulate", post(simulate_handler))
        .route("/api/simulate/progress", get(progress_handler))
        .route("/api/simulate/cancel", post(cancel_handler))
        .route("/api/statistics", get(statistics_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, stats: Option<ReturnStatistics>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    if stats.is_none() {
        warn!("no return statistics loaded; /api/simulate will answer 503");
    }
    let app = router(AppState::new(stats));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "planner HTTP API listening");

    axum::serve(listener, app).await
}

pub fn build_project_response(params: &ProjectionParams) -> ProjectResponse {
    let years = project(params);
    let invested_amount = invested_amount(params.initial_investment, &years);
    ProjectResponse {
        years,
        invested_amount,
    }
}

/// Runs a simulation request on `simulator`, seeding the generator from the
/// request when a seed is given.
pub async fn run_simulate_request(
    simulator: &MonteCarloSimulator,
    stats: &ReturnStatistics,
    request: &SimulateRequest,
    cancel: &CancellationToken,
) -> Result<SimulateResponse, SimulationError> {
    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let result = simulator
        .simulate(&request.params, stats, request.simulations, &mut rng, cancel)
        .await?;

    Ok(SimulateResponse {
        horizon_years: request.params.horizon_years(),
        simulations: request.simulations,
        statistics: *stats,
        result,
    })
}

async fn project_handler(Json(payload): Json<ProjectPayload>) -> Response {
    match projection_params_from_payload(payload) {
        Ok(params) => json_response(StatusCode::OK, build_project_response(&params)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn simulate_handler(
    State(state): State<AppState>,
    Json(payload): Json<SimulatePayload>,
) -> Response {
    let request = match simulate_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let Some(stats) = state.stats.clone() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "historical return statistics are not loaded",
        );
    };
    let cancel = CancellationToken::new();
    match run_simulate_request(&state.simulator, &stats, &request, &cancel).await {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => simulation_error_response(&err),
    }
}

async fn progress_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        ProgressResponse {
            running: state.simulator.is_running(),
            progress: state.simulator.current_progress(),
        },
    )
}

async fn cancel_handler(State(state): State<AppState>) -> Response {
    let running = state.simulator.cancel_current();
    json_response(
        StatusCode::OK,
        ProgressResponse {
            running,
            progress: state.simulator.current_progress(),
        },
    )
}

async fn statistics_handler(State(state): State<AppState>) -> Response {
    match state.stats.as_deref() {
        Some(stats) => json_response(StatusCode::OK, stats),
        None => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "historical return statistics are not loaded",
        ),
    }
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn simulation_error_response(err: &SimulationError) -> Response {
    match err {
        SimulationError::Reentrancy | SimulationError::Cancelled { .. } => {
            error_response(StatusCode::CONFLICT, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
