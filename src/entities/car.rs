use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A car in the dealership's inventory. Status and location change only
/// through movement and sale operations.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 17-character alphanumeric VIN, unique and case-sensitive.
    #[sea_orm(unique)]
    pub vin: String,
    pub model: String,
    pub color: String,
    pub purchase_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub status: CarStatus,
    pub location: String,
    pub arrival_date: DateTime,
    pub sale_date: Option<DateTime>,
    pub buyer_id: Option<i32>,
}

/// Invariant: `Sold` iff sale_price, sale_date and buyer_id are all set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    #[sea_orm(string_value = "in_stock")]
    InStock,
    #[sea_orm(string_value = "in_showroom")]
    InShowroom,
    #[sea_orm(string_value = "in_service")]
    InService,
    #[sea_orm(string_value = "sold")]
    Sold,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::buyer::Entity",
        from = "Column::BuyerId",
        to = "super::buyer::Column::Id"
    )]
    Buyer,
    #[sea_orm(has_many = "super::movement::Entity")]
    Movements,
    #[sea_orm(has_many = "super::operation::Entity")]
    Operations,
}

impl Related<super::buyer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buyer.def()
    }
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl Related<super::operation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Operations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
