use crate::{
    db::DbPool,
    entities::operation::{self, Entity as Operation, OperationKind},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::sync::Arc;
use tracing::instrument;

/// Query surface over the append-only operation log. Entries are written by
/// the car, movement and sales services; nothing updates or deletes them
/// here.
#[derive(Clone)]
pub struct OperationLogService {
    db_pool: Arc<DbPool>,
}

impl OperationLogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Log entries, most recent first, optionally filtered by kind
    #[instrument(skip(self))]
    pub async fn list_operations(
        &self,
        offset: u64,
        limit: u64,
        kind: Option<OperationKind>,
    ) -> Result<Vec<operation::Model>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = Operation::find().order_by_desc(operation::Column::Date);
        if let Some(kind) = kind {
            query = query.filter(operation::Column::Kind.eq(kind));
        }
        query
            .offset(offset)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
