//! Maps loosely-headed spreadsheets onto the canonical record fields.
//!
//! Production sheets go through a fixed, case-sensitive rename table. Supply
//! sheets have their headers lower-cased first and then mapped from the legacy
//! column names. Both paths are pure: a new table is returned and the input
//! is left untouched. Headers that are not in a table pass through unchanged.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::db::{NewProductionRecord, NewSupplyRecord, SupplyType, Unit};
use crate::importers::sheet::{Cell, SheetTable};

pub mod fields {
    pub const DATE: &str = "date";
    pub const AREA: &str = "area";
    pub const CROP: &str = "crop";
    pub const BOXES_GRADE1: &str = "boxes_grade1";
    pub const BOXES_GRADE2: &str = "boxes_grade2";
    pub const TEMPERATURE: &str = "temperature_c";
    pub const HUMIDITY: &str = "humidity_pct";
    pub const RAINFALL: &str = "rainfall_mm";
    pub const NOTE: &str = "note";

    pub const SUPPLY_TYPE: &str = "supply_type";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT: &str = "unit";
    pub const UNIT_COST: &str = "unit_cost";
    pub const TOTAL_COST: &str = "total_cost";
    pub const SUPPLIER: &str = "supplier";
    pub const LOT: &str = "lot";
    pub const NOTES: &str = "notes";
}

use fields::*;

const PRODUCTION_RENAMES: &[(&str, &str)] = &[
    ("Estufa", AREA),
    ("Área", AREA),
    ("Produção", BOXES_GRADE1),
    ("Primeira", BOXES_GRADE1),
    ("Qtd", BOXES_GRADE1),
    ("Quantidade", BOXES_GRADE1),
    ("Segunda", BOXES_GRADE2),
    ("Data", DATE),
    ("Observação", NOTE),
    ("Observacoes", NOTE),
    ("Obs", NOTE),
    // legacy storage schema
    ("data", DATE),
    ("estufa", AREA),
    ("cultura", CROP),
    ("caixas", BOXES_GRADE1),
    ("caixas_segunda", BOXES_GRADE2),
    ("temperatura", TEMPERATURE),
    ("umidade", HUMIDITY),
    ("chuva", RAINFALL),
    ("observacao", NOTE),
];

const SUPPLY_RENAMES: &[(&str, &str)] = &[
    ("data", DATE),
    ("cultura", CROP),
    ("tipo", SUPPLY_TYPE),
    ("quantidade", QUANTITY),
    ("unidade", UNIT),
    ("custo_unitario", UNIT_COST),
    ("custo_total", TOTAL_COST),
    ("fornecedor", SUPPLIER),
    ("lote", LOT),
    ("observacoes", NOTES),
];

/// Days between the spreadsheet epoch and 9999-12-31
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

fn rename(header: &str, table: &[(&str, &'static str)]) -> String {
    table
        .iter()
        .find(|(from, _)| *from == header)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| header.to_string())
}

/// Canonicalize a production sheet: rename headers, coerce the date column
/// to ISO text and inject defaults for absent fields
pub fn normalize_production_sheet(sheet: &SheetTable) -> SheetTable {
    let headers: Vec<String> = sheet
        .headers
        .iter()
        .map(|h| rename(h, PRODUCTION_RENAMES))
        .collect();
    let mut table = SheetTable::new(headers, sheet.rows.clone());

    if let Some(col) = table.column(DATE) {
        for row in table.rows.iter_mut() {
            if let Some(cell) = row.get_mut(col) {
                *cell = match parse_date_cell(cell) {
                    Some(date) => Cell::Text(date.format("%Y-%m-%d").to_string()),
                    None => Cell::Empty,
                };
            }
        }
    }

    let defaults = [
        (BOXES_GRADE1, Cell::Int(0)),
        (BOXES_GRADE2, Cell::Int(0)),
        (TEMPERATURE, Cell::Int(0)),
        (HUMIDITY, Cell::Int(0)),
        (RAINFALL, Cell::Int(0)),
        (NOTE, Cell::text("")),
        (AREA, Cell::text("")),
        (CROP, Cell::text("")),
    ];
    for (field, default) in defaults {
        inject_column(&mut table, field, default);
    }

    debug!("Normalized production sheet headers: {:?}", table.headers);
    table
}

/// Lower-case the headers and map legacy supply column names
pub fn normalize_supply_sheet(sheet: &SheetTable) -> SheetTable {
    let headers: Vec<String> = sheet
        .headers
        .iter()
        .map(|h| rename(&h.trim().to_lowercase(), SUPPLY_RENAMES))
        .collect();
    debug!("Normalized supply sheet headers: {:?}", headers);
    SheetTable::new(headers, sheet.rows.clone())
}

fn inject_column(table: &mut SheetTable, field: &str, default: Cell) {
    if table.has_column(field) {
        return;
    }
    let width = table.headers.len();
    table.headers.push(field.to_string());
    for row in table.rows.iter_mut() {
        row.resize(width, Cell::Empty);
        row.push(default.clone());
    }
}

/// Accepts date cells, ISO dates and date-times, `yyyy/mm/dd`, `dd/mm/yyyy`,
/// `mm/dd/yyyy` and serial numbers
pub fn parse_date_cell(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(date) => Some(*date),
        Cell::Text(s) => parse_date_text(s.trim()),
        Cell::Int(serial) => serial_to_date(*serial as f64),
        Cell::Float(serial) => serial_to_date(*serial),
        Cell::Bool(_) | Cell::Empty => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(s, "%Y/%m/%d").ok())
        .or_else(|| NaiveDate::parse_from_str(s, "%d/%m/%Y").ok())
        // day-first wins; month-first only when the day slot exceeds 12
        .or_else(|| NaiveDate::parse_from_str(s, "%m/%d/%Y").ok())
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DATE {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Non-numeric counts become 0 and negative counts clamp to 0
fn box_count(cell: &Cell) -> u32 {
    cell.as_f64()
        .map(|f| f.trunc().clamp(0.0, u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn number_or_zero(cell: &Cell) -> f64 {
    cell.as_f64().unwrap_or(0.0)
}

/// Turn a normalized production sheet into insertable records
pub fn production_rows(table: &SheetTable) -> Vec<NewProductionRecord> {
    (0..table.len())
        .map(|row| NewProductionRecord {
            date: parse_date_cell(table.get(row, DATE)),
            area: table.get(row, AREA).to_text(),
            crop: table.get(row, CROP).to_text(),
            boxes_grade1: box_count(table.get(row, BOXES_GRADE1)),
            boxes_grade2: box_count(table.get(row, BOXES_GRADE2)),
            temperature_c: Some(number_or_zero(table.get(row, TEMPERATURE))),
            humidity_pct: Some(number_or_zero(table.get(row, HUMIDITY))),
            rainfall_mm: Some(number_or_zero(table.get(row, RAINFALL))),
            note: table.get(row, NOTE).to_text(),
        })
        .collect()
}

/// Turn a normalized supply sheet into insertable records. Unknown supply
/// types are filed under `Other`; unknown units fall back to kg.
pub fn supply_rows(table: &SheetTable) -> Vec<NewSupplyRecord> {
    (0..table.len())
        .map(|row| {
            let type_text = table.get(row, SUPPLY_TYPE).to_text();
            let supply_type = SupplyType::parse_label(&type_text).unwrap_or_else(|| {
                warn!("Unknown supply type '{}' in row {}, using Other", type_text, row + 1);
                SupplyType::Other
            });

            let unit_text = table.get(row, UNIT).to_text();
            let unit = Unit::parse_label(&unit_text).unwrap_or_else(|| {
                if !unit_text.is_empty() {
                    warn!("Unknown unit '{}' in row {}, using kg", unit_text, row + 1);
                }
                Unit::Kg
            });

            let crop = table.get(row, CROP).to_text();

            NewSupplyRecord {
                date: parse_date_cell(table.get(row, DATE)),
                area: table.get(row, AREA).to_text(),
                crop: if crop.is_empty() { None } else { Some(crop) },
                supply_type,
                quantity: number_or_zero(table.get(row, QUANTITY)).max(0.0),
                unit,
                unit_cost: number_or_zero(table.get(row, UNIT_COST)).max(0.0),
                total_cost: number_or_zero(table.get(row, TOTAL_COST)).max(0.0),
                supplier: table.get(row, SUPPLIER).to_text(),
                lot: table.get(row, LOT).to_text(),
                notes: table.get(row, NOTES).to_text(),
            }
        })
        .collect()
}
