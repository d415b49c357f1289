pub mod buyers;
pub mod cars;
pub mod common;
pub mod imports;
pub mod movements;
pub mod reports;
pub mod sales;

use crate::{
    clock::Clock,
    db::DbPool,
    services::{
        buyers::BuyerService, cars::CarService, imports::ImportService,
        movements::MovementService, operations::OperationLogService, reports::ReportService,
        sales::SalesService,
    },
    AppState,
};
use axum::Router;
use std::sync::Arc;

/// Constructed services shared through application state.
#[derive(Clone)]
pub struct AppServices {
    pub cars: Arc<CarService>,
    pub movements: Arc<MovementService>,
    pub sales: Arc<SalesService>,
    pub buyers: Arc<BuyerService>,
    pub operations: Arc<OperationLogService>,
    pub imports: Arc<ImportService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn build(db: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cars: Arc::new(CarService::new(db.clone(), clock.clone())),
            movements: Arc::new(MovementService::new(db.clone())),
            sales: Arc::new(SalesService::new(db.clone(), clock.clone())),
            buyers: Arc::new(BuyerService::new(db.clone())),
            operations: Arc::new(OperationLogService::new(db.clone())),
            imports: Arc::new(ImportService::new(db.clone(), clock)),
            reports: Arc::new(ReportService::new(db)),
        }
    }
}

/// The `/api` routing tree.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/cars", cars::car_routes())
        .nest("/movements", movements::movement_routes())
        .nest("/sales", sales::sale_routes())
        .nest("/buyers", buyers::buyer_routes())
        .nest("/reports", reports::report_routes())
        .nest("/imports", imports::import_routes())
}
