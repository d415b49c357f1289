use super::common::ListParams;
use crate::{errors::ServiceError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

async fn list_buyers(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let buyers = state
        .services
        .buyers
        .list_buyers(params.offset, params.limit)
        .await?;
    Ok(Json(buyers))
}

async fn get_buyer_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let buyer = state
        .services
        .buyers
        .get_buyer_by_name(&name)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("buyer '{}' not found", name)))?;
    Ok(Json(buyer))
}

pub fn buyer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_buyers))
        .route("/by-name/:name", get(get_buyer_by_name))
}
