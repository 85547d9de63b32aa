use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::db::{CostRecord, ProductionRecord, SupplyRecord};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
}

/// A record type with a fixed CSV header row
pub trait CsvRow: Serialize {
    const HEADERS: &'static [&'static str];
}

impl CsvRow for ProductionRecord {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "date",
        "area",
        "crop",
        "boxes_grade1",
        "boxes_grade2",
        "temperature_c",
        "humidity_pct",
        "rainfall_mm",
        "note",
    ];
}

impl CsvRow for SupplyRecord {
    const HEADERS: &'static [&'static str] = &[
        "id",
        "date",
        "area",
        "crop",
        "supply_type",
        "quantity",
        "unit",
        "unit_cost",
        "total_cost",
        "supplier",
        "lot",
        "notes",
    ];
}

impl CsvRow for CostRecord {
    const HEADERS: &'static [&'static str] =
        &["id", "date", "cost_type", "description", "value", "area", "notes"];
}

/// Header row followed by one line per record; the header is written even
/// when `records` is empty
pub fn write_csv<W: Write, T: CsvRow>(writer: W, records: &[T]) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(T::HEADERS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string<T: CsvRow>(records: &[T]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, records)?;
    Ok(String::from_utf8(buffer)?)
}
