//! Worksheet cell normalization.
//!
//! Raw workbook cells are converted once into [`CellValue`] and then into a
//! trimmed string. Nothing past the decoder sees calamine's representation.

use calamine::Data;
use chrono::{NaiveDateTime, Timelike};

/// A worksheet cell reduced to the shapes the importer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
    Blank,
}

impl CellValue {
    /// Normalized, trimmed text. Blank cells become the empty string.
    pub fn into_text(self) -> String {
        match self {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => format_number(n),
            CellValue::Date(dt) => format_date(dt),
            CellValue::Blank => String::new(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                CellValue::Text(s.clone())
            }
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(parsed) => CellValue::Date(parsed),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::Error(_) | Data::Empty => CellValue::Blank,
        }
    }
}

/// Read a raw cell straight to normalized text.
pub fn cell_text(cell: &Data) -> String {
    CellValue::from(cell).into_text()
}

/// Whole numbers print without a fractional part ("42", not "42.0").
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Date-only values print as `YYYY-MM-DD`, matching the due-date column format.
fn format_date(dt: NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
