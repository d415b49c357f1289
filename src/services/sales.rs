use crate::{
    clock::Clock,
    db::DbPool,
    entities::{
        buyer::{self, Entity as Buyer},
        car::{self, CarStatus, Entity as Car},
        operation::{self, OperationKind},
    },
    errors::ServiceError,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// A sale request. `sale_date` defaults to the current time when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct SellCar {
    pub vin: String,
    pub sale_price: Decimal,
    pub buyer_name: String,
    pub buyer_phone: Option<String>,
    pub buyer_email: Option<String>,
    pub sale_date: Option<NaiveDateTime>,
}

/// Finalises car sales: resolves the buyer and flips the car into its
/// terminal `sold` state.
#[derive(Clone)]
pub struct SalesService {
    db_pool: Arc<DbPool>,
    clock: Arc<dyn Clock>,
}

impl SalesService {
    pub fn new(db_pool: Arc<DbPool>, clock: Arc<dyn Clock>) -> Self {
        Self { db_pool, clock }
    }

    /// Sells the car with the given VIN. The buyer is resolved by exact
    /// name match and created with the supplied contact details only when
    /// missing; an existing buyer's contact info wins. The buyer row, the
    /// car mutation and the `sale` log entry commit in one transaction.
    ///
    /// A car can be sold once: no re-sale and no price correction through
    /// this path.
    #[instrument(skip(self))]
    pub async fn sell_car(&self, request: SellCar) -> Result<car::Model, ServiceError> {
        let db = &*self.db_pool;
        let car = Car::find()
            .filter(car::Column::Vin.eq(&request.vin))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("car with VIN {} not found", request.vin))
            })?;

        if car.status == CarStatus::Sold {
            return Err(ServiceError::AlreadySold(format!(
                "car {} is already sold",
                request.vin
            )));
        }

        let sale_date = request.sale_date.unwrap_or_else(|| self.clock.now());
        let sold = db
            .transaction::<_, car::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = Buyer::find()
                        .filter(buyer::Column::Name.eq(&request.buyer_name))
                        .one(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;
                    let buyer = match existing {
                        Some(buyer) => buyer,
                        None => buyer::ActiveModel {
                            name: Set(request.buyer_name.clone()),
                            phone: Set(request.buyer_phone.clone()),
                            email: Set(request.buyer_email.clone()),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?,
                    };

                    let mut active: car::ActiveModel = car.into();
                    active.status = Set(CarStatus::Sold);
                    active.sale_price = Set(Some(request.sale_price));
                    active.sale_date = Set(Some(sale_date));
                    active.buyer_id = Set(Some(buyer.id));
                    let sold = active
                        .update(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    let log_entry = operation::ActiveModel {
                        car_id: Set(Some(sold.id)),
                        kind: Set(OperationKind::Sale),
                        date: Set(sale_date),
                        details: Set(Some(format!(
                            "Sold VIN {} to {}, price {}",
                            sold.vin, buyer.name, request.sale_price
                        ))),
                        performed_by: Set("system".to_string()),
                        ..Default::default()
                    };
                    log_entry
                        .insert(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    Ok(sold)
                })
            })
            .await?;

        info!(car_id = sold.id, vin = %sold.vin, "car sold");
        Ok(sold)
    }

    /// Sold cars, optionally restricted to sales within the inclusive
    /// `[start_date, end_date]` range, most recent sale first.
    #[instrument(skip(self))]
    pub async fn list_sold_cars(
        &self,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<Vec<car::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = Car::find().filter(car::Column::Status.eq(CarStatus::Sold));
        if let Some(start) = start_date {
            query = query.filter(car::Column::SaleDate.gte(start));
        }
        if let Some(end) = end_date {
            query = query.filter(car::Column::SaleDate.lte(end));
        }
        query
            .order_by_desc(car::Column::SaleDate)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
