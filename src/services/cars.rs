use crate::{
    clock::Clock,
    db::DbPool,
    entities::{
        car::{self, CarStatus, Entity as Car},
        movement::{self, Entity as Movement},
        operation::{self, Entity as Operation, OperationKind},
    },
    errors::ServiceError,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Site whose name maps to `in_stock`; also the forced location of every
/// newly arrived car.
pub const WAREHOUSE_LOCATION: &str = "warehouse";
pub const SHOWROOM_LOCATION: &str = "showroom";
pub const SERVICE_LOCATION: &str = "service";

/// Derive a car's status from a site name. Case-insensitive and trimmed;
/// unrecognised sites fall back to `in_stock` rather than failing.
pub fn status_for_location(location: &str) -> CarStatus {
    match location.trim().to_lowercase().as_str() {
        WAREHOUSE_LOCATION => CarStatus::InStock,
        SHOWROOM_LOCATION => CarStatus::InShowroom,
        SERVICE_LOCATION => CarStatus::InService,
        _ => CarStatus::InStock,
    }
}

/// VIN format check: exactly 17 alphanumeric characters, case-sensitive.
pub fn is_valid_vin(vin: &str) -> bool {
    vin.len() == 17 && vin.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Fields for registering a newly arrived car.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCar {
    pub vin: String,
    pub model: String,
    pub color: String,
    pub purchase_price: Decimal,
    pub arrival_date: NaiveDateTime,
}

/// Partial update: `None` fields are untouched. For nullable columns the
/// outer `Option` distinguishes "absent" from an explicit null that clears
/// the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarUpdate {
    pub vin: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub purchase_price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub sale_price: Option<Option<Decimal>>,
    pub status: Option<CarStatus>,
    pub location: Option<String>,
    pub arrival_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "double_option")]
    pub sale_date: Option<Option<NaiveDateTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub buyer_id: Option<Option<i32>>,
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

/// The inventory ledger: owns car records, their status/location state
/// machine and the arrival entries of the operation log.
#[derive(Clone)]
pub struct CarService {
    db_pool: Arc<DbPool>,
    clock: Arc<dyn Clock>,
}

impl CarService {
    pub fn new(db_pool: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self { db_pool, clock }
    }

    /// Registers an arrival: inserts the car with status `in_stock` at the
    /// warehouse and appends an `arrival` operation, atomically.
    ///
    /// Duplicate VINs are rejected up front; a concurrent insert of the
    /// same VIN is still caught by the storage-level unique index and
    /// mapped to the same error kind.
    #[instrument(skip(self))]
    pub async fn create_car(&self, new_car: NewCar) -> Result<car::Model, ServiceError> {
        if !is_valid_vin(&new_car.vin) {
            return Err(ServiceError::ValidationError(format!(
                "VIN '{}' must be exactly 17 alphanumeric characters",
                new_car.vin
            )));
        }
        if new_car.purchase_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "purchase price {} must be non-negative",
                new_car.purchase_price
            )));
        }

        let db = &*self.db_pool;
        let existing = Car::find()
            .filter(car::Column::Vin.eq(&new_car.vin))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateVin(new_car.vin));
        }

        let logged_at = self.clock.now();
        let created = db
            .transaction::<_, car::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let car = car::ActiveModel {
                        vin: Set(new_car.vin.clone()),
                        model: Set(new_car.model),
                        color: Set(new_car.color),
                        purchase_price: Set(new_car.purchase_price),
                        sale_price: Set(None),
                        status: Set(CarStatus::InStock),
                        location: Set(WAREHOUSE_LOCATION.to_string()),
                        arrival_date: Set(new_car.arrival_date),
                        sale_date: Set(None),
                        buyer_id: Set(None),
                        ..Default::default()
                    };
                    let car = car.insert(txn).await.map_err(|e| match e.sql_err() {
                        Some(SqlErr::UniqueConstraintViolation(_)) => {
                            ServiceError::DuplicateVin(new_car.vin.clone())
                        }
                        _ => ServiceError::DatabaseError(e),
                    })?;

                    let log_entry = operation::ActiveModel {
                        car_id: Set(Some(car.id)),
                        kind: Set(OperationKind::Arrival),
                        date: Set(logged_at),
                        details: Set(Some(format!("Arrival of car VIN {}, {}", car.vin, car.model))),
                        performed_by: Set("system".to_string()),
                        ..Default::default()
                    };
                    log_entry
                        .insert(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    Ok(car)
                })
            })
            .await?;

        info!(car_id = created.id, vin = %created.vin, "car registered");
        Ok(created)
    }

    /// Gets a car by its surrogate id
    #[instrument(skip(self))]
    pub async fn get_car(&self, id: i32) -> Result<Option<car::Model>, ServiceError> {
        let db = &*self.db_pool;
        Car::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Gets a car by VIN (exact, case-sensitive)
    #[instrument(skip(self))]
    pub async fn get_car_by_vin(&self, vin: &str) -> Result<Option<car::Model>, ServiceError> {
        let db = &*self.db_pool;
        Car::find()
            .filter(car::Column::Vin.eq(vin))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists cars with pagination and an optional status filter
    #[instrument(skip(self))]
    pub async fn list_cars(
        &self,
        offset: u64,
        limit: u64,
        status: Option<CarStatus>,
    ) -> Result<Vec<car::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = Car::find();
        if let Some(status) = status {
            query = query.filter(car::Column::Status.eq(status));
        }
        query
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists only the cars currently in stock
    #[instrument(skip(self))]
    pub async fn list_cars_in_stock(&self) -> Result<Vec<car::Model>, ServiceError> {
        let db = &*self.db_pool;
        Car::find()
            .filter(car::Column::Status.eq(CarStatus::InStock))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Applies only the fields present in the update; absent fields stay
    /// untouched and explicit nulls clear nullable fields.
    #[instrument(skip(self))]
    pub async fn update_car(&self, id: i32, update: CarUpdate) -> Result<car::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = Car::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("car {} not found", id)))?;

        let mut active: car::ActiveModel = existing.into();
        if let Some(vin) = update.vin {
            if !is_valid_vin(&vin) {
                return Err(ServiceError::ValidationError(format!(
                    "VIN '{}' must be exactly 17 alphanumeric characters",
                    vin
                )));
            }
            active.vin = Set(vin);
        }
        if let Some(model) = update.model {
            active.model = Set(model);
        }
        if let Some(color) = update.color {
            active.color = Set(color);
        }
        if let Some(purchase_price) = update.purchase_price {
            if purchase_price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "purchase price {} must be non-negative",
                    purchase_price
                )));
            }
            active.purchase_price = Set(purchase_price);
        }
        if let Some(sale_price) = update.sale_price {
            active.sale_price = Set(sale_price);
        }
        if let Some(status) = update.status {
            active.status = Set(status);
        }
        if let Some(location) = update.location {
            active.location = Set(location);
        }
        if let Some(arrival_date) = update.arrival_date {
            active.arrival_date = Set(arrival_date);
        }
        if let Some(sale_date) = update.sale_date {
            active.sale_date = Set(sale_date);
        }
        if let Some(buyer_id) = update.buyer_id {
            active.buyer_id = Set(buyer_id);
        }

        active.update(db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::DuplicateVin("updated VIN already exists".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })
    }

    /// Hard-deletes a car together with its movements and operation log
    /// entries, in dependency order within one transaction. Not reversible.
    #[instrument(skip(self))]
    pub async fn delete_car(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let car = Car::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("car {} not found", id)))?;

        db.transaction::<_, (), ServiceError>(move |txn| {
            Box::pin(async move {
                Operation::delete_many()
                    .filter(operation::Column::CarId.eq(id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                Movement::delete_many()
                    .filter(movement::Column::CarId.eq(id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                Car::delete_by_id(id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                Ok(())
            })
        })
        .await?;

        info!(car_id = id, vin = %car.vin, "car deleted with its history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_mapping_is_case_insensitive_and_trimmed() {
        assert_eq!(status_for_location("warehouse"), CarStatus::InStock);
        assert_eq!(status_for_location("  Showroom "), CarStatus::InShowroom);
        assert_eq!(status_for_location("SERVICE"), CarStatus::InService);
    }

    #[test]
    fn unknown_location_falls_back_to_in_stock() {
        assert_eq!(status_for_location("partner lot 7"), CarStatus::InStock);
        assert_eq!(status_for_location(""), CarStatus::InStock);
    }

    #[test]
    fn vin_check_requires_17_alphanumerics() {
        assert!(is_valid_vin("1HGCM82633A123456"));
        assert!(!is_valid_vin("1HGCM82633A12345"));
        assert!(!is_valid_vin("1HGCM82633A1234567"));
        assert!(!is_valid_vin("1HGCM82633A12345-"));
        assert!(!is_valid_vin(""));
    }
}
