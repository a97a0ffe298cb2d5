//! Time dimension detection and canonical period keys.
//!
//! Detection combines column-name vocabularies with value-level validation on
//! a bounded sample, then selects a grain by precedence:
//! date > year+month > year+quarter > year > none. Period keys are formatted
//! so lexicographic order equals chronological order.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    data::{Cell, Column, Dataset, parse_timestamp},
    error::CoreError,
};

const VALIDATION_SAMPLE_SIZE: usize = 10;

const MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

fn date_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(date|datetime|timestamp|fecha|datum)").expect("static pattern"))
}

fn year_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(year|ann[ée]e|jahr|anio|año)").expect("static pattern"))
}

fn month_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(month|mois|monat|^mes$)").expect("static pattern"))
}

fn quarter_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(quarter|qtr|trimestre|^q$)").expect("static pattern"))
}

/// Granularity at which periods are distinguished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGrain {
    Date,
    YearMonth,
    YearQuarter,
    Year,
    None,
}

impl PeriodGrain {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodGrain::Date => "date",
            PeriodGrain::YearMonth => "year_month",
            PeriodGrain::YearQuarter => "year_quarter",
            PeriodGrain::Year => "year",
            PeriodGrain::None => "none",
        }
    }
}

/// Columns backing each role of the selected grain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Derivations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarter_column: Option<String>,
}

impl Derivations {
    pub fn as_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(col) = &self.date_column {
            pairs.push(("date_column".to_string(), col.clone()));
        }
        if let Some(col) = &self.year_column {
            pairs.push(("year_column".to_string(), col.clone()));
        }
        if let Some(col) = &self.month_column {
            pairs.push(("month_column".to_string(), col.clone()));
        }
        if let Some(col) = &self.quarter_column {
            pairs.push(("quarter_column".to_string(), col.clone()));
        }
        pairs
    }
}

/// Everything detection reports: selected grain, the candidates considered,
/// and the derivation columns a period key is composed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeInfo {
    pub period_grain: PeriodGrain,
    pub period_grain_candidates: Vec<PeriodGrain>,
    pub time_candidates: Vec<String>,
    pub selected_time_columns: Vec<(String, String)>,
    pub derivations: Derivations,
    pub warnings: Vec<String>,
}

impl TimeInfo {
    pub fn selected(&self, role: &str) -> Option<&str> {
        self.selected_time_columns
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, c)| c.as_str())
    }
}

/// Finds temporal columns and selects a grain by precedence.
pub fn detect_time_dimensions(dataset: &Dataset, settings: &Settings) -> TimeInfo {
    let threshold = settings.time_validation_threshold;
    let mut date_cols = Vec::new();
    let mut year_cols = Vec::new();
    let mut month_cols = Vec::new();
    let mut quarter_cols = Vec::new();
    let mut time_candidates = Vec::new();

    for column in &dataset.columns {
        let name = column.name.as_str();
        let mut is_candidate = false;
        if date_header_re().is_match(name) && validates(column, threshold, date_cell_valid) {
            date_cols.push(name.to_string());
            is_candidate = true;
        }
        if year_header_re().is_match(name)
            && validates(column, threshold, |c| year_value(c, settings).is_some())
        {
            year_cols.push(name.to_string());
            is_candidate = true;
        }
        if month_header_re().is_match(name) && validates(column, threshold, |c| month_value(c).is_some())
        {
            month_cols.push(name.to_string());
            is_candidate = true;
        }
        if quarter_header_re().is_match(name)
            && validates(column, threshold, |c| quarter_value(c).is_some())
        {
            quarter_cols.push(name.to_string());
            is_candidate = true;
        }
        if is_candidate {
            time_candidates.push(name.to_string());
        }
    }

    let mut period_grain_candidates = Vec::new();
    if !date_cols.is_empty() {
        period_grain_candidates.push(PeriodGrain::Date);
    }
    if !year_cols.is_empty() && !month_cols.is_empty() {
        period_grain_candidates.push(PeriodGrain::YearMonth);
    }
    if !year_cols.is_empty() && !quarter_cols.is_empty() {
        period_grain_candidates.push(PeriodGrain::YearQuarter);
    }
    if !year_cols.is_empty() {
        period_grain_candidates.push(PeriodGrain::Year);
    }
    if period_grain_candidates.is_empty() {
        period_grain_candidates.push(PeriodGrain::None);
    }
    let period_grain = period_grain_candidates[0];

    let mut warnings = Vec::new();
    let mut selected_time_columns = Vec::new();
    let mut derivations = Derivations::default();

    match period_grain {
        PeriodGrain::Date => {
            select_role(
                "date",
                &date_cols,
                &mut selected_time_columns,
                &mut warnings,
            );
            derivations.date_column = Some(date_cols[0].clone());
        }
        PeriodGrain::YearMonth => {
            select_role(
                "year",
                &year_cols,
                &mut selected_time_columns,
                &mut warnings,
            );
            select_role(
                "month",
                &month_cols,
                &mut selected_time_columns,
                &mut warnings,
            );
            derivations.year_column = Some(year_cols[0].clone());
            derivations.month_column = Some(month_cols[0].clone());
        }
        PeriodGrain::YearQuarter => {
            select_role(
                "year",
                &year_cols,
                &mut selected_time_columns,
                &mut warnings,
            );
            select_role(
                "quarter",
                &quarter_cols,
                &mut selected_time_columns,
                &mut warnings,
            );
            derivations.year_column = Some(year_cols[0].clone());
            derivations.quarter_column = Some(quarter_cols[0].clone());
        }
        PeriodGrain::Year => {
            select_role(
                "year",
                &year_cols,
                &mut selected_time_columns,
                &mut warnings,
            );
            derivations.year_column = Some(year_cols[0].clone());
        }
        PeriodGrain::None => {
            warnings.push("No temporal dimension detected".to_string());
        }
    }

    debug!(
        "Time detection selected grain '{}' from {} candidate column(s)",
        period_grain.as_str(),
        time_candidates.len()
    );

    TimeInfo {
        period_grain,
        period_grain_candidates,
        time_candidates,
        selected_time_columns,
        derivations,
        warnings,
    }
}

/// Picks the first qualifying column for a role; extra qualifiers are kept in
/// a warning so the choice stays auditable.
fn select_role(
    role: &str,
    candidates: &[String],
    selected: &mut Vec<(String, String)>,
    warnings: &mut Vec<String>,
) {
    selected.push((role.to_string(), candidates[0].clone()));
    if candidates.len() > 1 {
        warnings.push(format!(
            "Multiple {role} columns found: {}; using '{}'",
            candidates.join(", "),
            candidates[0]
        ));
    }
}

/// True when at least the configured fraction of a bounded sample validates.
fn validates(column: &Column, threshold: f64, valid: impl Fn(&Cell) -> bool) -> bool {
    let sample: Vec<&Cell> = column.non_missing().take(VALIDATION_SAMPLE_SIZE).collect();
    if sample.is_empty() {
        return false;
    }
    let valid_count = sample.iter().filter(|cell| valid(cell)).count();
    valid_count as f64 / sample.len() as f64 >= threshold
}

fn date_cell_valid(cell: &Cell) -> bool {
    match cell {
        Cell::Timestamp(_) => true,
        Cell::Text(s) => parse_timestamp(s).is_some(),
        _ => false,
    }
}

fn year_value(cell: &Cell, settings: &Settings) -> Option<i64> {
    let (min, max) = settings.year_range;
    let value = match cell {
        Cell::Number(n) if n.fract() == 0.0 => *n as i64,
        Cell::Text(s) => {
            let parsed: f64 = s.trim().parse().ok()?;
            if parsed.fract() != 0.0 {
                return None;
            }
            parsed as i64
        }
        _ => return None,
    };
    (min..=max).contains(&value).then_some(value)
}

fn month_value(cell: &Cell) -> Option<u32> {
    match cell {
        Cell::Number(n) if n.fract() == 0.0 && (1.0..=12.0).contains(n) => Some(*n as u32),
        Cell::Text(s) => {
            let lowered = s.trim().to_lowercase();
            if let Ok(numeric) = lowered.parse::<f64>() {
                if numeric.fract() == 0.0 && (1.0..=12.0).contains(&numeric) {
                    return Some(numeric as u32);
                }
                return None;
            }
            MONTH_NAMES
                .iter()
                .find(|(name, _)| *name == lowered || name.starts_with(&lowered) && lowered.len() >= 3)
                .map(|(_, number)| *number)
        }
        _ => None,
    }
}

fn quarter_value(cell: &Cell) -> Option<u32> {
    match cell {
        Cell::Number(n) if n.fract() == 0.0 && (1.0..=4.0).contains(n) => Some(*n as u32),
        Cell::Text(s) => {
            let lowered = s.trim().to_lowercase();
            let body = lowered.strip_prefix('q').unwrap_or(&lowered);
            let numeric: f64 = body.parse().ok()?;
            (numeric.fract() == 0.0 && (1.0..=4.0).contains(&numeric)).then_some(numeric as u32)
        }
        _ => None,
    }
}

/// Composes one canonical period key per row for the given grain. Rows whose
/// required inputs are missing or invalid yield `UNKNOWN`; grain `none` yields
/// `ALL` everywhere.
pub fn compose_period_key(
    dataset: &Dataset,
    grain: PeriodGrain,
    derivations: &Derivations,
) -> Result<Vec<String>, CoreError> {
    let rows = dataset.row_count();
    match grain {
        PeriodGrain::None => Ok(vec!["ALL".to_string(); rows]),
        PeriodGrain::Date => {
            let column = required(dataset, grain, "date", derivations.date_column.as_deref())?;
            Ok(column
                .values
                .iter()
                .map(|cell| match cell {
                    Some(Cell::Timestamp(ts)) => ts.format("%Y-%m-%d").to_string(),
                    Some(Cell::Text(s)) => parse_timestamp(s)
                        .map(|ts| ts.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(unknown),
                    _ => unknown(),
                })
                .collect())
        }
        PeriodGrain::YearMonth => {
            let years = required(dataset, grain, "year", derivations.year_column.as_deref())?;
            let months = required(dataset, grain, "month", derivations.month_column.as_deref())?;
            Ok((0..rows)
                .map(|row| {
                    let year = cell_at(years, row).and_then(year_number);
                    let month = cell_at(months, row).and_then(month_value);
                    match (year, month) {
                        (Some(y), Some(m)) => format!("{y}-M{m:02}"),
                        _ => unknown(),
                    }
                })
                .collect())
        }
        PeriodGrain::YearQuarter => {
            let years = required(dataset, grain, "year", derivations.year_column.as_deref())?;
            let quarters = required(
                dataset,
                grain,
                "quarter",
                derivations.quarter_column.as_deref(),
            )?;
            Ok((0..rows)
                .map(|row| {
                    let year = cell_at(years, row).and_then(year_number);
                    let quarter = cell_at(quarters, row).and_then(quarter_value);
                    match (year, quarter) {
                        (Some(y), Some(q)) => format!("{y}-Q{q}"),
                        _ => unknown(),
                    }
                })
                .collect())
        }
        PeriodGrain::Year => {
            let years = required(dataset, grain, "year", derivations.year_column.as_deref())?;
            Ok(years
                .values
                .iter()
                .map(|cell| {
                    cell.as_ref()
                        .and_then(year_number)
                        .map(|y| y.to_string())
                        .unwrap_or_else(unknown)
                })
                .collect())
        }
    }
}

fn unknown() -> String {
    "UNKNOWN".to_string()
}

fn cell_at(column: &Column, row: usize) -> Option<&Cell> {
    column.values.get(row).and_then(|v| v.as_ref())
}

/// Year extraction for key composition: integral values only, no range check
/// (range plausibility already gated detection).
fn year_number(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Number(n) if n.fract() == 0.0 => Some(*n as i64),
        Cell::Text(s) => {
            let parsed: f64 = s.trim().parse().ok()?;
            (parsed.fract() == 0.0).then_some(parsed as i64)
        }
        _ => None,
    }
}

fn required<'a>(
    dataset: &'a Dataset,
    grain: PeriodGrain,
    role: &str,
    name: Option<&str>,
) -> Result<&'a Column, CoreError> {
    let name = name.ok_or_else(|| CoreError::MissingDerivation {
        grain: grain.as_str().to_string(),
        role: role.to_string(),
    })?;
    dataset.require_column(name)
}
