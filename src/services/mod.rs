// Core domain services
pub mod cars;
pub mod movements;
pub mod sales;

// Lookups over related records
pub mod buyers;
pub mod operations;

// Batch CSV ingestion
pub mod imports;

// Read-side aggregations
pub mod reports;
