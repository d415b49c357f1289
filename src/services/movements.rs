use crate::{
    db::DbPool,
    entities::{
        car::{self, CarStatus, Entity as Car},
        movement::{self, Entity as Movement},
        operation::{self, OperationKind},
    },
    errors::ServiceError,
    services::cars::status_for_location,
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Records relocation events and keeps car state in step with them.
#[derive(Clone)]
pub struct MovementService {
    db_pool: Arc<DbPool>,
}

impl MovementService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Relocates a car identified by VIN. A non-empty `from_location` must
    /// exactly equal the car's current location; an empty one means the
    /// caller does not know the prior location and skips the check. The
    /// movement record, the car mutation and the operation log entry commit
    /// together or not at all; on any failure the car and its history are
    /// left untouched.
    ///
    /// Sold is a terminal status: moving a sold car fails rather than
    /// clobbering its sale state.
    #[instrument(skip(self))]
    pub async fn move_car(
        &self,
        vin: &str,
        from_location: &str,
        to_location: &str,
        date: NaiveDateTime,
    ) -> Result<movement::Model, ServiceError> {
        let db = &*self.db_pool;
        let car = Car::find()
            .filter(car::Column::Vin.eq(vin))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("car with VIN {} not found", vin)))?;

        if car.status == CarStatus::Sold {
            return Err(ServiceError::AlreadySold(format!(
                "car {} is already sold",
                vin
            )));
        }
        if !from_location.is_empty() && car.location != from_location {
            return Err(ServiceError::LocationMismatch(format!(
                "car {} is at '{}', not '{}'",
                vin, car.location, from_location
            )));
        }

        let vin = vin.to_string();
        let to_location = to_location.to_string();
        let recorded = db
            .transaction::<_, movement::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let previous_location = car.location.clone();
                    let recorded = movement::ActiveModel {
                        car_id: Set(car.id),
                        date: Set(date),
                        from_location: Set(previous_location.clone()),
                        to_location: Set(to_location.clone()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;

                    let car_id = car.id;
                    let mut active: car::ActiveModel = car.into();
                    active.location = Set(to_location.clone());
                    active.status = Set(status_for_location(&to_location));
                    active
                        .update(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    let log_entry = operation::ActiveModel {
                        car_id: Set(Some(car_id)),
                        kind: Set(OperationKind::Movement),
                        date: Set(date),
                        details: Set(Some(format!(
                            "Moved VIN {}: {} -> {}",
                            vin, previous_location, to_location
                        ))),
                        performed_by: Set("system".to_string()),
                        ..Default::default()
                    };
                    log_entry
                        .insert(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    Ok(recorded)
                })
            })
            .await?;

        info!(
            movement_id = recorded.id,
            car_id = recorded.car_id,
            to = %recorded.to_location,
            "car relocated"
        );
        Ok(recorded)
    }

    /// A car's relocation history, oldest first
    #[instrument(skip(self))]
    pub async fn list_movements_for_car(
        &self,
        car_id: i32,
    ) -> Result<Vec<movement::Model>, ServiceError> {
        let db = &*self.db_pool;
        Movement::find()
            .filter(movement::Column::CarId.eq(car_id))
            .order_by_asc(movement::Column::Date)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// All relocations across the fleet, most recent first
    #[instrument(skip(self))]
    pub async fn list_all_movements(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<movement::Model>, ServiceError> {
        let db = &*self.db_pool;
        Movement::find()
            .order_by_desc(movement::Column::Date)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
