use crate::{errors::ServiceError, services::sales::SellCar, AppState};
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SoldCarsParams {
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

async fn create_sale(
    State(state): State<AppState>,
    Json(request): Json<SellCar>,
) -> Result<impl IntoResponse, ServiceError> {
    let sold = state.services.sales.sell_car(request).await?;
    Ok((StatusCode::CREATED, Json(sold)))
}

async fn list_sold_cars(
    State(state): State<AppState>,
    Query(params): Query<SoldCarsParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let cars = state
        .services
        .sales
        .list_sold_cars(params.start_date, params.end_date)
        .await?;
    Ok(Json(cars))
}

pub fn sale_routes() -> Router<AppState> {
    Router::new().route("/", get(list_sold_cars).post(create_sale))
}
