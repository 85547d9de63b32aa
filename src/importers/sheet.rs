use chrono::NaiveDate;

/// One spreadsheet cell, detached from the workbook library
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            Cell::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Display form used for free-text fields
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Cell::Float(f) => f.to_string(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Header row plus data rows; rows may be shorter than the header
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

static EMPTY: Cell = Cell::Empty;

impl SheetTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cell of `row` under header `name`, `Cell::Empty` when absent
    pub fn get(&self, row: usize, name: &str) -> &Cell {
        self.column(name)
            .and_then(|col| self.rows.get(row).and_then(|r| r.get(col)))
            .unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
