use crate::{
    db::DbPool,
    entities::buyer::{self, Entity as Buyer},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use std::sync::Arc;
use tracing::instrument;

/// Read access to buyer records. Buyers are created as a side effect of
/// sales, never directly.
#[derive(Clone)]
pub struct BuyerService {
    db_pool: Arc<DbPool>,
}

impl BuyerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists buyers with pagination
    #[instrument(skip(self))]
    pub async fn list_buyers(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<buyer::Model>, ServiceError> {
        let db = &*self.db_pool;
        Buyer::find()
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Finds a buyer by exact name match. No normalization: differing case
    /// or whitespace is a different buyer.
    #[instrument(skip(self))]
    pub async fn get_buyer_by_name(&self, name: &str) -> Result<Option<buyer::Model>, ServiceError> {
        let db = &*self.db_pool;
        Buyer::find()
            .filter(buyer::Column::Name.eq(name))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
