use chrono::NaiveDate;
use farm_tracker_service::db::DbPool;
use farm_tracker_service::importers::{Cell, SheetTable};
use sqlx::SqlitePool;

/// Fresh migrated in-memory database. A single connection keeps every
/// query on the same memory store.
pub async fn test_pool() -> SqlitePool {
    DbPool::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database")
        .into_inner()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sheet(headers: &[&str], rows: Vec<Vec<Cell>>) -> SheetTable {
    SheetTable::new(headers.iter().map(|h| h.to_string()).collect(), rows)
}
