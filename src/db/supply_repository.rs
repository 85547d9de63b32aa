use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::db::{DbError, NewSupplyRecord, SupplyRecord};

const SELECT_COLUMNS: &str = r#"
    SELECT id, record_date, area, crop, supply_type, quantity, unit,
           unit_cost, total_cost, supplier, lot, notes
    FROM supply_records
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO supply_records
        (record_date, area, crop, supply_type, quantity, unit,
         unit_cost, total_cost, supplier, lot, notes)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

#[derive(Clone)]
pub struct SupplyRepository {
    pool: SqlitePool,
}

impl SupplyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores the record as given; `total_cost` must already be resolved
    #[instrument(skip(self, record), fields(supply_type = record.supply_type.label()))]
    pub async fn insert(&self, record: &NewSupplyRecord) -> Result<i64, DbError> {
        let result = sqlx::query(INSERT_SQL)
            .bind(record.date)
            .bind(&record.area)
            .bind(&record.crop)
            .bind(record.supply_type.label())
            .bind(record.quantity)
            .bind(record.unit.label())
            .bind(record.unit_cost)
            .bind(record.total_cost)
            .bind(&record.supplier)
            .bind(&record.lot)
            .bind(&record.notes)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        debug!("Inserted supply record {}", id);
        Ok(id)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_many(&self, records: &[NewSupplyRecord]) -> Result<usize, DbError> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(INSERT_SQL)
                .bind(record.date)
                .bind(&record.area)
                .bind(&record.crop)
                .bind(record.supply_type.label())
                .bind(record.quantity)
                .bind(record.unit.label())
                .bind(record.unit_cost)
                .bind(record.total_cost)
                .bind(&record.supplier)
                .bind(&record.lot)
                .bind(&record.notes)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Inserted {} supply records", records.len());
        Ok(records.len())
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<SupplyRecord>, DbError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY record_date, id");
        let records = sqlx::query_as::<_, SupplyRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!("Found {} supply records", records.len());
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<SupplyRecord>, DbError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let record = sqlx::query_as::<_, SupplyRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM supply_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted supply record {}", id);
        }
        Ok(deleted)
    }
}
