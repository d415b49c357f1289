use crate::{
    db::DbPool,
    entities::{
        buyer,
        car::{self, CarStatus, Entity as Car},
    },
    errors::ServiceError,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Read-side aggregations over ledger state. Nothing here mutates.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

/// Sales over a period with a per-model breakdown.
#[derive(Debug, Serialize, Deserialize)]
pub struct SalesReport {
    pub period: ReportPeriod,
    pub total_count: u64,
    pub total_sales: Decimal,
    pub total_profit: Decimal,
    pub average_price: Decimal,
    pub by_model: Vec<ModelSales>,
}

/// Actual bounds of the sales considered, falling back to the requested
/// bounds when nothing was sold.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelSales {
    pub model: String,
    pub count: u64,
    pub total: Decimal,
    pub profit: Decimal,
}

/// Unsold stock grouped by model, then color.
#[derive(Debug, Serialize, Deserialize)]
pub struct StockReport {
    pub total_count: u64,
    pub total_value: Decimal,
    pub by_model: Vec<ModelStock>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelStock {
    pub model: String,
    pub count: u64,
    pub value: Decimal,
    pub by_color: Vec<ColorStock>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ColorStock {
    pub color: String,
    pub count: u64,
    pub cars: Vec<StockCar>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StockCar {
    pub vin: String,
    pub purchase_price: Decimal,
    pub location: String,
}

/// Buyers with their purchases, sorted by total spend descending.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuyersReport {
    pub total_buyers: u64,
    pub buyers: Vec<BuyerPurchases>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuyerPurchases {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub purchases_count: u64,
    pub total_spent: Decimal,
    pub cars: Vec<PurchasedCar>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchasedCar {
    pub vin: String,
    pub model: String,
    pub color: String,
    pub sale_price: Decimal,
    pub sale_date: String,
    pub profit: Decimal,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Sales summary for a period; with no bounds, every sold car counts.
    #[instrument(skip(self))]
    pub async fn sales_report(
        &self,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<SalesReport, ServiceError> {
        let db = &*self.db_pool;
        let mut query = Car::find().filter(car::Column::Status.eq(CarStatus::Sold));
        if let Some(start) = start_date {
            query = query.filter(car::Column::SaleDate.gte(start));
        }
        if let Some(end) = end_date {
            query = query.filter(car::Column::SaleDate.lte(end));
        }
        let sold = query.all(db).await.map_err(ServiceError::DatabaseError)?;

        let total_count = sold.len() as u64;
        let total_sales: Decimal = sold.iter().filter_map(|c| c.sale_price).sum();
        let total_purchase: Decimal = sold.iter().map(|c| c.purchase_price).sum();
        let total_profit = total_sales - total_purchase;
        let average_price = if total_count > 0 {
            total_sales / Decimal::from(total_count)
        } else {
            Decimal::ZERO
        };

        let sale_dates: Vec<NaiveDateTime> = sold.iter().filter_map(|c| c.sale_date).collect();
        let period = ReportPeriod {
            start: sale_dates
                .iter()
                .min()
                .map(|d| d.date())
                .or(start_date.map(|d| d.date())),
            end: sale_dates
                .iter()
                .max()
                .map(|d| d.date())
                .or(end_date.map(|d| d.date())),
        };

        let mut grouped: HashMap<String, ModelSales> = HashMap::new();
        for car in &sold {
            let entry = grouped
                .entry(car.model.clone())
                .or_insert_with(|| ModelSales {
                    model: car.model.clone(),
                    count: 0,
                    total: Decimal::ZERO,
                    profit: Decimal::ZERO,
                });
            entry.count += 1;
            let sale_price = car.sale_price.unwrap_or(Decimal::ZERO);
            entry.total += sale_price;
            entry.profit += sale_price - car.purchase_price;
        }
        let mut by_model: Vec<ModelSales> = grouped.into_values().collect();
        by_model.sort_by(|a, b| a.model.cmp(&b.model));

        Ok(SalesReport {
            period,
            total_count,
            total_sales,
            total_profit,
            average_price,
            by_model,
        })
    }

    /// Everything not yet sold, grouped by model then color, with per-car
    /// detail and aggregate value.
    #[instrument(skip(self))]
    pub async fn stock_report(&self) -> Result<StockReport, ServiceError> {
        let db = &*self.db_pool;
        let cars = Car::find()
            .filter(car::Column::Status.ne(CarStatus::Sold))
            .order_by_asc(car::Column::Model)
            .order_by_asc(car::Column::Color)
            .order_by_asc(car::Column::Vin)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let total_count = cars.len() as u64;
        let total_value: Decimal = cars.iter().map(|c| c.purchase_price).sum();

        // Rows arrive sorted by model and color, so one ordered fold builds
        // both grouping levels.
        let mut by_model: Vec<ModelStock> = Vec::new();
        for car in cars {
            if by_model.last().map_or(true, |m| m.model != car.model) {
                by_model.push(ModelStock {
                    model: car.model.clone(),
                    count: 0,
                    value: Decimal::ZERO,
                    by_color: Vec::new(),
                });
            }
            if let Some(model_group) = by_model.last_mut() {
                model_group.count += 1;
                model_group.value += car.purchase_price;

                if model_group
                    .by_color
                    .last()
                    .map_or(true, |c| c.color != car.color)
                {
                    model_group.by_color.push(ColorStock {
                        color: car.color.clone(),
                        count: 0,
                        cars: Vec::new(),
                    });
                }
                if let Some(color_group) = model_group.by_color.last_mut() {
                    color_group.count += 1;
                    color_group.cars.push(StockCar {
                        vin: car.vin,
                        purchase_price: car.purchase_price,
                        location: car.location,
                    });
                }
            }
        }

        Ok(StockReport {
            total_count,
            total_value,
            by_model,
        })
    }

    /// Buyers and the cars sold to them, biggest spender first.
    #[instrument(skip(self))]
    pub async fn buyers_report(&self) -> Result<BuyersReport, ServiceError> {
        let db = &*self.db_pool;
        let buyers_with_cars = buyer::Entity::find()
            .find_with_related(Car)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut buyers: Vec<BuyerPurchases> = Vec::with_capacity(buyers_with_cars.len());
        for (buyer, cars) in buyers_with_cars {
            let sold: Vec<&car::Model> = cars
                .iter()
                .filter(|c| c.status == CarStatus::Sold)
                .collect();
            let total_spent: Decimal = sold.iter().filter_map(|c| c.sale_price).sum();
            let purchases = sold
                .iter()
                .map(|c| {
                    let sale_price = c.sale_price.unwrap_or(Decimal::ZERO);
                    PurchasedCar {
                        vin: c.vin.clone(),
                        model: c.model.clone(),
                        color: c.color.clone(),
                        sale_price,
                        sale_date: c
                            .sale_date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_default(),
                        profit: sale_price - c.purchase_price,
                    }
                })
                .collect();

            buyers.push(BuyerPurchases {
                name: buyer.name,
                phone: buyer.phone.unwrap_or_default(),
                email: buyer.email.unwrap_or_default(),
                purchases_count: sold.len() as u64,
                total_spent,
                cars: purchases,
            });
        }

        buyers.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));

        Ok(BuyersReport {
            total_buyers: buyers.len() as u64,
            buyers,
        })
    }
}
