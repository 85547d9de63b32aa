use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::db::{DbError, NewProductionRecord, ProductionRecord};

const SELECT_COLUMNS: &str = r#"
    SELECT id, record_date, area, crop, boxes_grade1, boxes_grade2,
           temperature_c, humidity_pct, rainfall_mm, note
    FROM production_records
"#;

#[derive(Clone)]
pub struct ProductionRepository {
    pool: SqlitePool,
}

impl ProductionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one entry; missing weather readings are stored as 0
    #[instrument(skip(self, record), fields(area = %record.area, crop = %record.crop))]
    pub async fn insert(&self, record: &NewProductionRecord) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO production_records
                (record_date, area, crop, boxes_grade1, boxes_grade2,
                 temperature_c, humidity_pct, rainfall_mm, note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.date)
        .bind(&record.area)
        .bind(&record.crop)
        .bind(i64::from(record.boxes_grade1))
        .bind(i64::from(record.boxes_grade2))
        .bind(record.temperature_c.unwrap_or_default())
        .bind(record.humidity_pct.unwrap_or_default())
        .bind(record.rainfall_mm.unwrap_or_default())
        .bind(&record.note)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Inserted production record {}", id);
        Ok(id)
    }

    /// Insert multiple entries in a transaction
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_many(&self, records: &[NewProductionRecord]) -> Result<usize, DbError> {
        debug!("Beginning transaction to insert {} production records", records.len());
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO production_records
                    (record_date, area, crop, boxes_grade1, boxes_grade2,
                     temperature_c, humidity_pct, rainfall_mm, note)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.date)
            .bind(&record.area)
            .bind(&record.crop)
            .bind(i64::from(record.boxes_grade1))
            .bind(i64::from(record.boxes_grade2))
            .bind(record.temperature_c.unwrap_or_default())
            .bind(record.humidity_pct.unwrap_or_default())
            .bind(record.rainfall_mm.unwrap_or_default())
            .bind(&record.note)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Inserted {} production records", records.len());
        Ok(records.len())
    }

    /// All entries, oldest first
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<ProductionRecord>, DbError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY record_date, id");
        let records = sqlx::query_as::<_, ProductionRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!("Found {} production records", records.len());
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ProductionRecord>, DbError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let record = sqlx::query_as::<_, ProductionRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Most recently entered record
    #[instrument(skip(self))]
    pub async fn find_latest(&self) -> Result<Option<ProductionRecord>, DbError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT 1");
        let record = sqlx::query_as::<_, ProductionRecord>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        if record.is_none() {
            debug!("No production records in database");
        }
        Ok(record)
    }

    /// Returns false when no row had that id
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM production_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted production record {}", id);
        }
        Ok(deleted)
    }
}
