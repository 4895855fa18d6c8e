//! Network routes - topology lifecycle and solver requests
//!
//! ```text
//! client  -->  network routes  -->  SliceOrchestrator  -->  solver (POST /cbs)
//!                                          |
//!                                          +-->  inventory (topology build)
//! ```

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use topology::{Constraint, TopologyView};

use crate::{error::ApiError, response::ApiResponse, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphJsonResponse {
    pub graph: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetSolverRequest {
    pub host: String,
    pub port: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolveRequest {
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolveResponse {
    pub response: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/network/graph",
            post(create_graph).delete(delete_graph).get(show_graph),
        )
        .route("/network/graph/json", get(get_graph))
        .route("/network/cbs", put(set_solver_location))
        .route("/network/solve", post(request_solution))
}

async fn create_graph(State(state): State<AppState>) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.orchestrator.create_topology().await?;
    Ok(Json(ApiResponse::success(())))
}

async fn delete_graph(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    state.orchestrator.delete_topology().await;
    Json(ApiResponse::success(()))
}

async fn show_graph(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TopologyView>>, ApiError> {
    let view = state.orchestrator.show_topology().await?;
    Ok(Json(ApiResponse::success(view)))
}

async fn get_graph(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GraphJsonResponse>>, ApiError> {
    let graph = state.orchestrator.get_topology_json().await?;
    Ok(Json(ApiResponse::success(GraphJsonResponse { graph })))
}

async fn set_solver_location(
    State(state): State<AppState>,
    Json(body): Json<SetSolverRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .orchestrator
        .set_solver_address(&body.host, &body.port)
        .await?;
    Ok(Json(ApiResponse::success(())))
}

async fn request_solution(
    State(state): State<AppState>,
    Json(body): Json<SolveRequest>,
) -> Result<Json<ApiResponse<SolveResponse>>, ApiError> {
    let response = state.orchestrator.request_solution(body.constraints).await?;
    Ok(Json(ApiResponse::success(SolveResponse { response })))
}
