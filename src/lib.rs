//! Dealership API Library
//!
//! Record keeping for a vehicle dealership: cars arrive at the warehouse,
//! move between sites, get sold, and every state change lands in an
//! append-only operation log. Batches of arrivals, movements and sales can
//! be ingested from semicolon-delimited files with per-row error isolation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod services;

use clock::Clock;
use handlers::AppServices;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub clock: Arc<dyn Clock>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let services = AppServices::build(db.clone(), clock.clone());
        Self {
            db,
            config,
            clock,
            services,
        }
    }
}
