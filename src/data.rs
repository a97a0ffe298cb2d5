use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single typed cell. Missing values are represented as `Option::None` at the
/// column level rather than as a variant here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Timestamp(NaiveDateTime),
    Boolean(bool),
}

impl Cell {
    pub fn as_display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Timestamp(ts) => {
                if ts.time() == NaiveTime::MIN {
                    ts.format("%Y-%m-%d").to_string()
                } else {
                    ts.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            Cell::Boolean(b) => b.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// An ordered column of optionally-missing cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<Cell>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<Cell>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Builds an all-text column, mapping empty/whitespace strings to missing.
    pub fn from_text(name: impl Into<String>, values: &[&str]) -> Self {
        let values = values
            .iter()
            .map(|raw| {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Cell::Text((*raw).to_string()))
                }
            })
            .collect();
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn non_missing(&self) -> impl Iterator<Item = &Cell> {
        self.values.iter().filter_map(|v| v.as_ref())
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// An in-memory tabular dataset: ordered named columns of equal length.
/// Column order and row order are significant and preserved end-to-end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Looks a column up by name, reporting absence as a caller-contract error.
    pub fn require_column(&self, name: &str) -> Result<&Column, CoreError> {
        self.column(name)
            .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))
    }

    /// Verifies that every column holds the same number of rows.
    pub fn ensure_rectangular(&self) -> Result<(), CoreError> {
        let expected = self.row_count();
        for column in &self.columns {
            if column.values.len() != expected {
                return Err(CoreError::RaggedDataset {
                    column: column.name.clone(),
                    expected,
                    actual: column.values.len(),
                });
            }
        }
        Ok(())
    }
}

pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    None
}

pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    None
}

/// Parses a value as a point in time, accepting both date-only and datetime
/// renderings. Date-only inputs land on midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(date) = parse_naive_date(trimmed) {
        return date.and_hms_opt(0, 0, 0);
    }
    parse_naive_datetime(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn display_drops_trailing_zero_fraction() {
        assert_eq!(Cell::Number(1000.0).as_display(), "1000");
        assert_eq!(Cell::Number(12.5).as_display(), "12.5");
    }

    #[test]
    fn display_renders_midnight_as_plain_date() {
        let midnight = NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Cell::Timestamp(midnight).as_display(), "2023-01-15");

        let afternoon = NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(
            Cell::Timestamp(afternoon).as_display(),
            "2023-01-15 14:30:00"
        );
    }

    #[test]
    fn from_text_maps_blank_values_to_missing() {
        let column = Column::from_text("status", &["open", "", "  ", "closed"]);
        assert_eq!(column.null_count(), 2);
        assert_eq!(column.values[0], Some(Cell::Text("open".to_string())));
    }

    #[test]
    fn parse_timestamp_supports_date_and_datetime_inputs() {
        let date_only = parse_timestamp("2023-01-15").unwrap();
        assert_eq!(
            date_only.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2023-01-15 00:00:00"
        );

        let with_time = parse_timestamp("2023-01-15 10:30:00").unwrap();
        assert_eq!(with_time.hour(), 10);
    }

    #[test]
    fn require_column_reports_missing_names() {
        let dataset = Dataset::new(vec![Column::from_text("entity", &["A"])]);
        assert!(dataset.require_column("entity").is_ok());
        let err = dataset.require_column("revenue").unwrap_err();
        assert!(err.to_string().contains("revenue"));
    }

    #[test]
    fn ensure_rectangular_rejects_ragged_columns() {
        let dataset = Dataset::new(vec![
            Column::from_text("a", &["1", "2"]),
            Column::from_text("b", &["1"]),
        ]);
        assert!(dataset.ensure_rectangular().is_err());
    }
}
