use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::allocation::{AllocationMode, AllocationPlan, PhasedPlan};
use crate::config::Config;
use crate::dataset::{Dataset, SourceInfo};
use crate::effectiveness::{rank, CostEffectivenessRank};
use crate::error::EngineError;
use crate::index::{relative_need, CompositeScore, RelativeNeed};
use crate::projection::{project, Outlook, ProjectionResult};
use crate::report::{self, ExecutiveSummary};

#[derive(Clone)]
pub struct ApiState {
    config: Arc<Config>,
    dataset: Arc<Dataset>,
}

impl ApiState {
    pub fn new(config: Config, dataset: Arc<Dataset>) -> Self {
        Self {
            config: Arc::new(config),
            dataset,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        Self::bad_request(error.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<EngineError>() {
            Some(engine) => Self::bad_request(engine.to_string()),
            None => Self::internal(format!("{error:#}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Default, Deserialize)]
struct AllocationRequest {
    budget: Option<f64>,
    mode: Option<String>,
    precision: Option<u32>,
}

impl AllocationRequest {
    fn apply(&self, config: &Config) -> std::result::Result<Config, ApiError> {
        let mut config = config.clone();
        if let Some(budget) = self.budget {
            config.allocation.total_budget = budget;
        }
        if let Some(mode) = &self.mode {
            config.allocation.mode = mode.parse::<AllocationMode>()?;
        }
        if let Some(precision) = self.precision {
            config.allocation.precision = precision;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectionRequest {
    country: String,
    intervention_year: Option<i32>,
    target_year: Option<i32>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ScoresResponse {
    scores: Vec<CompositeScore>,
    relative_need: Vec<RelativeNeed>,
}

#[derive(Debug, Serialize)]
struct SourcesResponse {
    uses_fallback: bool,
    sources: Vec<SourceInfo>,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/config", get(show_config))
        .route("/v1/sources", get(sources))
        .route("/v1/scores", get(scores))
        .route("/v1/allocation", post(allocation))
        .route("/v1/phases", post(phases))
        .route("/v1/projection", post(projection))
        .route("/v1/outlook", get(outlook))
        .route("/v1/rankings", get(rankings))
        .route("/v1/summary", get(summary))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(config: Config, dataset: Arc<Dataset>, bind: SocketAddr) -> Result<()> {
    let app = router(ApiState::new(config, dataset));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config.as_ref().clone())
}

async fn sources(State(state): State<ApiState>) -> Json<ApiResponse<SourcesResponse>> {
    ok(SourcesResponse {
        uses_fallback: state.dataset.uses_fallback(),
        sources: state.dataset.sources(),
    })
}

async fn scores(State(state): State<ApiState>) -> ApiResult<ScoresResponse> {
    let scores = report::scores(&state.dataset, &state.config)?;
    let relative_need = relative_need(&scores);
    Ok(ok(ScoresResponse {
        scores,
        relative_need,
    }))
}

async fn allocation(
    State(state): State<ApiState>,
    Json(request): Json<AllocationRequest>,
) -> ApiResult<AllocationPlan> {
    let config = request.apply(&state.config)?;
    Ok(ok(report::allocation_plan(&state.dataset, &config)?))
}

async fn phases(
    State(state): State<ApiState>,
    Json(request): Json<AllocationRequest>,
) -> ApiResult<PhasedPlan> {
    let config = request.apply(&state.config)?;
    Ok(ok(report::phased_plan(&state.dataset, &config)?))
}

async fn projection(
    State(state): State<ApiState>,
    Json(request): Json<ProjectionRequest>,
) -> ApiResult<ProjectionResult> {
    let Some(series) = state.dataset.series_for(&request.country) else {
        return Err(ApiError::not_found(format!(
            "no literacy series for {}",
            request.country
        )));
    };
    let defaults = &state.config.projection;
    let result = project(
        series,
        request
            .intervention_year
            .unwrap_or(defaults.intervention_year),
        request.target_year.unwrap_or(defaults.target_year),
        defaults,
    )?;
    Ok(ok(result))
}

async fn outlook(State(state): State<ApiState>) -> ApiResult<Outlook> {
    Ok(ok(report::outlook(&state.dataset, &state.config)?))
}

async fn rankings(State(state): State<ApiState>) -> ApiResult<Vec<CostEffectivenessRank>> {
    Ok(ok(rank(&state.dataset.programs.data)?))
}

async fn summary(State(state): State<ApiState>) -> ApiResult<ExecutiveSummary> {
    Ok(ok(report::build_summary(&state.dataset, &state.config)?))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::{router, ApiState};
    use crate::config::Config;
    use crate::dataset::Dataset;

    fn state() -> ApiState {
        ApiState::new(
            Config::default(),
            Arc::new(Dataset::builtin().expect("dataset")),
        )
    }

    fn send(request: Request<Body>) -> (StatusCode, Value) {
        tokio_test::block_on(async {
            let response = router(state()).oneshot(request).await.expect("response");
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body");
            let json = serde_json::from_slice(&bytes).expect("json body");
            (status, json)
        })
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[test]
    fn health_reports_ok() {
        let (status, body) = send(get("/health"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[test]
    fn scores_are_sorted_by_need() {
        let (status, body) = send(get("/v1/scores"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["scores"][0]["country"], "Sudan");
        assert_eq!(body["data"]["scores"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn allocation_accepts_budget_override() {
        let (status, body) = send(post("/v1/allocation", r#"{"budget": 100.0}"#));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_budget"], 100.0);
        assert_eq!(body["data"]["basis"], "proportional");
    }

    #[test]
    fn negative_budget_is_a_bad_request() {
        let (status, body) = send(post("/v1/allocation", r#"{"budget": -5.0}"#));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[test]
    fn unknown_mode_is_a_bad_request() {
        let (status, _) = send(post("/v1/phases", r#"{"mode": "lottery"}"#));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn projection_for_unknown_country_is_not_found() {
        let (status, _) = send(post("/v1/projection", r#"{"country": "Atlantis"}"#));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn projection_uses_configured_years() {
        let (status, body) = send(post("/v1/projection", r#"{"country": "morocco"}"#));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["target_year"], 2030);
        assert_eq!(body["data"]["intervention_year"], 2014);
    }

    #[test]
    fn projection_past_horizon_is_a_bad_request() {
        let (status, body) = send(post(
            "/v1/projection",
            r#"{"country": "morocco", "target_year": 2000000000}"#,
        ));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[test]
    fn summary_flags_fallback_data() {
        let (status, body) = send(get("/v1/summary"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["uses_fallback_data"], true);
        assert_eq!(body["data"]["on_track_count"], 3);
    }
}
