//! Spreadsheet import and CSV export

pub mod column_normalizer;
pub mod csv_export;
pub mod excel_importer;
pub mod sheet;

pub use column_normalizer::{
    normalize_production_sheet, normalize_supply_sheet, production_rows, supply_rows,
};
pub use csv_export::{to_csv_string, write_csv, CsvRow, ExportError};
pub use excel_importer::{ExcelImporter, SheetImportError};
pub use sheet::{Cell, SheetTable};
