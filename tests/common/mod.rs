#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use dealership_api::{
    clock::{Clock, FixedClock},
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    entities::car::{self, CarStatus},
    services::cars::NewCar,
    AppState,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

/// Fresh in-memory database. A single-connection pool keeps every query on
/// the same SQLite memory instance.
pub async fn setup_db() -> Arc<DbPool> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&config)
        .await
        .expect("failed to connect to in-memory sqlite");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");
    Arc::new(pool)
}

pub fn test_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(datetime(2024, 3, 1, 12, 0, 0)))
}

pub fn datetime(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(hour, min, sec)
        .expect("valid time")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    datetime(year, month, day, 0, 0, 0)
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid decimal")
}

pub fn new_car(vin: &str, model: &str, color: &str, price: &str) -> NewCar {
    NewCar {
        vin: vin.to_string(),
        model: model.to_string(),
        color: color.to_string(),
        purchase_price: dec(price),
        arrival_date: date(2024, 1, 10),
    }
}

/// Test application serving the real `/api` routing tree over a fresh
/// in-memory database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = setup_db().await;
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        let state = AppState::new(db, cfg, test_clock());
        let router = Router::new()
            .nest("/api", dealership_api::handlers::api_router())
            .with_state(state.clone());
        Self { router, state }
    }

    /// Send a request against the router, with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

/// `sold` iff sale_price, sale_date and buyer are all set.
pub fn assert_sold_invariant(car: &car::Model) {
    let sold = car.status == CarStatus::Sold;
    assert_eq!(
        sold,
        car.sale_price.is_some() && car.sale_date.is_some() && car.buyer_id.is_some(),
        "sold-state invariant violated for VIN {}",
        car.vin
    );
}
