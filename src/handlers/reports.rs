use super::common::default_limit;
use crate::{entities::operation::OperationKind, errors::ServiceError, AppState};
use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ReportPeriodParams {
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct OperationLogParams {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub kind: Option<OperationKind>,
}

async fn sales_report(
    State(state): State<AppState>,
    Query(params): Query<ReportPeriodParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state
        .services
        .reports
        .sales_report(params.start_date, params.end_date)
        .await?;
    Ok(Json(report))
}

async fn stock_report(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let report = state.services.reports.stock_report().await?;
    Ok(Json(report))
}

async fn buyers_report(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let report = state.services.reports.buyers_report().await?;
    Ok(Json(report))
}

async fn list_operations(
    State(state): State<AppState>,
    Query(params): Query<OperationLogParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let operations = state
        .services
        .operations
        .list_operations(params.offset, params.limit, params.kind)
        .await?;
    Ok(Json(operations))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales_report))
        .route("/stock", get(stock_report))
        .route("/buyers", get(buyers_report))
        .route("/operations", get(list_operations))
}
