use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::importers::sheet::{Cell, SheetTable};

#[derive(Error, Debug)]
pub enum SheetImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Failed to read sheet {0}: {1}")]
    SheetRead(String, String),

    #[error("Sheet {0} has no header row")]
    MissingHeader(String),
}

/// Reads the first worksheet of an `.xlsx` workbook into a [`SheetTable`]
pub struct ExcelImporter;

impl ExcelImporter {
    /// Synchronous; call from `spawn_blocking` inside async code
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn read_path(path: impl AsRef<Path>) -> Result<SheetTable, SheetImportError> {
        let workbook: Xlsx<BufReader<File>> = open_workbook(path.as_ref())
            .map_err(|e: calamine::XlsxError| SheetImportError::WorkbookOpen(e.to_string()))?;
        Self::read_first_sheet(workbook)
    }

    /// Parse an uploaded workbook held in memory
    #[instrument(skip(bytes), fields(size = bytes.len()))]
    pub fn read_bytes(bytes: &[u8]) -> Result<SheetTable, SheetImportError> {
        let workbook = Xlsx::new(Cursor::new(bytes.to_vec()))
            .map_err(|e| SheetImportError::WorkbookOpen(e.to_string()))?;
        Self::read_first_sheet(workbook)
    }

    fn read_first_sheet<RS: Read + Seek>(
        mut workbook: Xlsx<RS>,
    ) -> Result<SheetTable, SheetImportError> {
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(SheetImportError::NoSheets)?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| SheetImportError::SheetRead(sheet_name.clone(), e.to_string()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| SheetImportError::MissingHeader(sheet_name.clone()))?
            .iter()
            .map(|data| Self::convert(data).to_text())
            .collect();
        debug!("Sheet {} headers: {:?}", sheet_name, headers);

        let mut skipped = 0;
        let data_rows: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(Self::convert).collect::<Vec<_>>())
            .filter(|cells| {
                let blank = cells.iter().all(Cell::is_empty);
                if blank {
                    skipped += 1;
                }
                !blank
            })
            .collect();

        info!(
            "Read {} rows from sheet {} ({} blank rows skipped)",
            data_rows.len(),
            sheet_name,
            skipped
        );
        Ok(SheetTable::new(headers, data_rows))
    }

    fn convert(data: &Data) -> Cell {
        match data {
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(excel_date) => match excel_date.as_datetime() {
                Some(dt) => Cell::Date(dt.date()),
                None => Cell::Float(excel_date.as_f64()),
            },
            Data::DateTimeIso(s) => Cell::Text(s.clone()),
            _ => Cell::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bytes_rejects_non_xlsx() {
        let result = ExcelImporter::read_bytes(b"area,crop\nGreenhouse 1,Tomato\n");
        assert!(matches!(result, Err(SheetImportError::WorkbookOpen(_))));
    }

    #[test]
    fn test_read_path_missing_file() {
        let result = ExcelImporter::read_path("does-not-exist.xlsx");
        assert!(matches!(result, Err(SheetImportError::WorkbookOpen(_))));
    }

    #[test]
    fn test_convert_cells() {
        assert_eq!(ExcelImporter::convert(&Data::Int(3)), Cell::Int(3));
        assert_eq!(
            ExcelImporter::convert(&Data::String("Tomato".to_string())),
            Cell::text("Tomato")
        );
        assert_eq!(ExcelImporter::convert(&Data::Empty), Cell::Empty);
    }
}
