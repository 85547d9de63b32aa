use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::db::{CostRecord, DbError, NewCostRecord};

#[derive(Clone)]
pub struct CostRepository {
    pool: SqlitePool,
}

impl CostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, record), fields(cost_type = %record.cost_type))]
    pub async fn insert(&self, record: &NewCostRecord) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO cost_records (record_date, cost_type, description, value, area, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.date)
        .bind(&record.cost_type)
        .bind(&record.description)
        .bind(record.value)
        .bind(&record.area)
        .bind(&record.notes)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Inserted cost record {}", id);
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<CostRecord>, DbError> {
        let records = sqlx::query_as::<_, CostRecord>(
            r#"
            SELECT id, record_date, cost_type, description, value, area, notes
            FROM cost_records
            ORDER BY record_date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} cost records", records.len());
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<CostRecord>, DbError> {
        let record = sqlx::query_as::<_, CostRecord>(
            r#"
            SELECT id, record_date, cost_type, description, value, area, notes
            FROM cost_records
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cost_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted cost record {}", id);
        }
        Ok(deleted)
    }
}
