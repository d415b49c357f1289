use super::common::ListParams;
use crate::{errors::ServiceError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MovementCreateBody {
    pub vin: String,
    pub from_location: String,
    pub to_location: String,
    pub date: Option<NaiveDateTime>,
}

async fn create_movement(
    State(state): State<AppState>,
    Json(body): Json<MovementCreateBody>,
) -> Result<impl IntoResponse, ServiceError> {
    let date = body.date.unwrap_or_else(|| state.clock.now());
    let movement = state
        .services
        .movements
        .move_car(&body.vin, &body.from_location, &body.to_location, date)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

async fn list_movements(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = state
        .services
        .movements
        .list_all_movements(params.offset, params.limit)
        .await?;
    Ok(Json(movements))
}

async fn list_car_movements(
    State(state): State<AppState>,
    Path(car_id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = state
        .services
        .movements
        .list_movements_for_car(car_id)
        .await?;
    Ok(Json(movements))
}

pub fn movement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movements).post(create_movement))
        .route("/car/:car_id", get(list_car_movements))
}
