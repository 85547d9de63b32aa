use tracing::instrument;

use crate::db::{CostRecord, CostRepository, DbError, NewCostRecord};
use crate::services::ServiceError;

#[derive(Clone)]
pub struct CostService {
    repo: CostRepository,
}

impl CostService {
    pub fn new(repo: CostRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<CostRecord>, DbError> {
        self.repo.find_all().await
    }

    #[instrument(skip(self, record))]
    pub async fn add(&self, record: NewCostRecord) -> Result<CostRecord, ServiceError> {
        if !record.value.is_finite() {
            return Err(ServiceError::Validation("value must be a number".to_string()));
        }
        if record.cost_type.trim().is_empty() {
            return Err(ServiceError::Validation("cost_type must not be empty".to_string()));
        }
        let id = self.repo.insert(&record).await?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cost record {id}")))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("Cost record {id}")))
        }
    }
}
