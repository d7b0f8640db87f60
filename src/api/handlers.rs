//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{ErrorResponse, SensitivityRequest, StressTestInfo};
use crate::engine::ScenarioComparison;
use crate::error::TcoError;
use crate::model::{ComparisonInput, TcoInput, TcoResult};
use crate::registry::RegistryEntry;
use crate::scenario::{
    SensitivityAnalysis, StressResult, StressSuite, StressTestId, stress_scenarios,
};

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// A JSON body whose decoding failure is reported like any other error.
type JsonBody<T> = Result<Json<T>, JsonRejection>;

fn bad_request(err: TcoError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn decode<T>(body: JsonBody<T>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| bad_request(TcoError::MalformedRequest(rejection.body_text())))
}

/// `POST /tco` → 200 + `TcoResult`, or 400 on invalid input.
pub async fn post_tco(
    State(state): State<Arc<AppState>>,
    body: JsonBody<TcoInput>,
) -> ApiResult<TcoResult> {
    let input = decode(body)?;
    state.engine.calculate_tco(&input).map(Json).map_err(bad_request)
}

/// `POST /compare` → 200 + `ScenarioComparison`.
pub async fn post_compare(
    State(state): State<Arc<AppState>>,
    body: JsonBody<ComparisonInput>,
) -> ApiResult<ScenarioComparison> {
    let input = decode(body)?;
    state.engine.compare_scenarios(&input).map(Json).map_err(bad_request)
}

/// `GET /stress-tests` → the catalog, base case first.
pub async fn get_stress_tests() -> Json<Vec<StressTestInfo>> {
    Json(stress_scenarios().iter().map(StressTestInfo::from).collect())
}

/// `POST /stress` → 200 + `StressSuite`.
pub async fn post_stress_all(
    State(state): State<Arc<AppState>>,
    body: JsonBody<TcoInput>,
) -> ApiResult<StressSuite> {
    let input = decode(body)?;
    state.engine.run_all_stress_tests(&input).map(Json).map_err(bad_request)
}

/// `POST /stress/{id}` → 200 + `StressResult`, 400 for an unknown id.
pub async fn post_stress_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: JsonBody<TcoInput>,
) -> ApiResult<StressResult> {
    let id: StressTestId = id.parse().map_err(bad_request)?;
    let input = decode(body)?;
    state.engine.run_stress_test(&input, id).map(Json).map_err(bad_request)
}

/// `POST /sensitivity` → 200 + `SensitivityAnalysis`.
pub async fn post_sensitivity(
    State(state): State<Arc<AppState>>,
    body: JsonBody<SensitivityRequest>,
) -> ApiResult<SensitivityAnalysis> {
    let request = decode(body)?;
    state
        .engine
        .run_sensitivity_analysis(&request.input, &request.variables())
        .map(Json)
        .map_err(bad_request)
}

/// `GET /registry` → every registry entry.
pub async fn get_registry(State(state): State<Arc<AppState>>) -> Json<Vec<RegistryEntry>> {
    Json(state.registry.entries().to_vec())
}
