use super::common::default_limit;
use crate::{
    entities::car::CarStatus,
    errors::ServiceError,
    services::cars::{CarUpdate, NewCar},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListCarsParams {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<CarStatus>,
}

async fn list_cars(
    State(state): State<AppState>,
    Query(params): Query<ListCarsParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let cars = state
        .services
        .cars
        .list_cars(params.offset, params.limit, params.status)
        .await?;
    Ok(Json(cars))
}

async fn list_cars_in_stock(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let cars = state.services.cars.list_cars_in_stock().await?;
    Ok(Json(cars))
}

async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let car = state
        .services
        .cars
        .get_car(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("car {} not found", id)))?;
    Ok(Json(car))
}

async fn get_car_by_vin(
    State(state): State<AppState>,
    Path(vin): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let car = state
        .services
        .cars
        .get_car_by_vin(&vin)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("car with VIN {} not found", vin)))?;
    Ok(Json(car))
}

async fn create_car(
    State(state): State<AppState>,
    Json(new_car): Json<NewCar>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.cars.create_car(new_car).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(update): Json<CarUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.cars.update_car(id, update).await?;
    Ok(Json(updated))
}

async fn delete_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.cars.delete_car(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn car_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/stock", get(list_cars_in_stock))
        .route("/vin/:vin", get(get_car_by_vin))
        .route("/:id", get(get_car).put(update_car).delete(delete_car))
}
