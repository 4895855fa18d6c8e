//! Slice routes

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use topology::{Constraint, Slice, SliceConfiguration};

use crate::{error::ApiError, response::ApiResponse, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSliceRequest {
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// `host:port` of the solver to use for this and later solves
    #[serde(default)]
    pub cbs_addr: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSliceResponse {
    pub uuid: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListSlicesResponse {
    pub slices: Vec<Slice>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slices", post(create_slice).get(list_slices))
        .route("/slices/{uuid}", get(get_slice).delete(delete_slice))
        .route("/slices/{uuid}/configure", post(configure_slice))
}

async fn create_slice(
    State(state): State<AppState>,
    Json(body): Json<CreateSliceRequest>,
) -> Result<Json<ApiResponse<CreateSliceResponse>>, ApiError> {
    let solver = body.cbs_addr.as_deref().filter(|addr| !addr.is_empty());
    let slice = state.slices.create_slice(body.constraints, solver).await?;
    Ok(Json(ApiResponse::success(CreateSliceResponse {
        uuid: slice.uuid,
    })))
}

async fn list_slices(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ListSlicesResponse>>, ApiError> {
    let slices = state.slices.list_slices().await?;
    Ok(Json(ApiResponse::success(ListSlicesResponse { slices })))
}

async fn get_slice(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<ApiResponse<Slice>>, ApiError> {
    let slice = state.slices.get_slice(&uuid).await?;
    Ok(Json(ApiResponse::success(slice)))
}

async fn delete_slice(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.slices.delete_slice(&uuid).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn configure_slice(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<ApiResponse<SliceConfiguration>>, ApiError> {
    let config = state.slices.configure_slice(&uuid).await?;
    Ok(Json(ApiResponse::success(config)))
}
