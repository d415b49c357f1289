use crate::{errors::ServiceError, services::imports::RecordKind, AppState};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::path::Path;

/// Upload handling is out of scope here; callers hand over a server-side
/// path to an already-staged file.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub path: String,
}

async fn import_arrivals(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .imports
        .process_file(Path::new(&request.path), Some(RecordKind::Arrivals))
        .await?;
    Ok(Json(report))
}

async fn import_movements(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .imports
        .process_file(Path::new(&request.path), Some(RecordKind::Movements))
        .await?;
    Ok(Json(report))
}

async fn import_sales(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .imports
        .process_file(Path::new(&request.path), Some(RecordKind::Sales))
        .await?;
    Ok(Json(report))
}

async fn import_auto(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .imports
        .process_file(Path::new(&request.path), None)
        .await?;
    Ok(Json(report))
}

pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/arrivals", post(import_arrivals))
        .route("/movements", post(import_movements))
        .route("/sales", post(import_sales))
        .route("/auto", post(import_auto))
}
