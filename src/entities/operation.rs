use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit log entry. Never updated or deleted, except as a
/// cascade of deleting the parent car. `car_id` is nullable to leave room
/// for operations not tied to a single car.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "operations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub car_id: Option<i32>,
    pub kind: OperationKind,
    pub date: DateTime,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    pub performed_by: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    #[sea_orm(string_value = "arrival")]
    Arrival,
    #[sea_orm(string_value = "movement")]
    Movement,
    #[sea_orm(string_value = "sale")]
    Sale,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::car::Entity",
        from = "Column::CarId",
        to = "super::car::Column::Id"
    )]
    Car,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
