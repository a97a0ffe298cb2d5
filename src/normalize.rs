//! Type normalization: header standardization, the ordered coercion cascade,
//! domain rules, and anomaly detection.
//!
//! This module owns the [`normalize`] entry point (the first pipeline stage),
//! the per-column coercion strategies (numeric, percent, datetime, boolean —
//! tried in that order, first success wins), and the assembly of the
//! [`DatasetSchema`] with full transformation provenance.
//!
//! Malformed *values* never raise: they become missing cells and are tallied
//! in per-column counters. Only structurally invalid input (a ragged dataset)
//! is an error.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    data::{Cell, Column, Dataset},
    error::CoreError,
    schema::{
        ColumnAnomalies, ColumnRole, ColumnSchema, CoercionCounters, DatasetMetadata,
        DatasetSchema, DecimalConvention, InferredType, TransformationSummary,
    },
};

const CURRENCY_CODE_PATTERN: &str = r"\b(CHF|USD|EUR|GBP|JPY)\b";
const PERCENT_HEADER_PATTERN: &str = r"(?i)(percent|pct|percentage|%|rate|ratio|margin)";
const TEMPORAL_HEADER_PATTERN: &str = r"(?i)(date|dt|time|timestamp|created|updated|modified)";

/// Column-name terms where negative values are legitimate. Revenue is
/// deliberately absent: unexpected negative revenue is always flagged.
const NEGATIVE_ALLOWED_TERMS: &[&str] = &[
    "gross_profit",
    "net_income",
    "cost",
    "expense",
    "margin",
    "ebitda",
    "ebit",
    "profit",
    "loss",
];

const BOOLEAN_TOKENS: &[&str] = &[
    "yes", "no", "y", "n", "true", "false", "t", "f", "1", "0",
];

/// Magnitude suffixes accepted at the end of a numeric token. Two-letter
/// suffixes must be listed so the anchored match prefers them over their
/// one-letter prefix.
const SCALE_SUFFIXES: &[(&str, f64)] = &[
    ("k", 1e3),
    ("m", 1e6),
    ("mm", 1e6),
    ("b", 1e9),
    ("bn", 1e9),
];

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w]").expect("static pattern"))
}

fn underscore_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("static pattern"))
}

fn currency_symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[$€£¥]").expect("static pattern"))
}

fn currency_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CURRENCY_CODE_PATTERN).expect("static pattern"))
}

fn percent_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PERCENT_HEADER_PATTERN).expect("static pattern"))
}

fn temporal_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TEMPORAL_HEADER_PATTERN).expect("static pattern"))
}

fn comma_decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\d{1,2}$").expect("static pattern"))
}

fn scale_suffix_res() -> &'static Vec<(Regex, f64)> {
    static RES: OnceLock<Vec<(Regex, f64)>> = OnceLock::new();
    RES.get_or_init(|| {
        SCALE_SUFFIXES
            .iter()
            .map(|(suffix, multiplier)| {
                let pattern = format!(r"(?i)(\d+(?:[.,]\d+)?)\s*{suffix}\s*$");
                (Regex::new(&pattern).expect("static pattern"), *multiplier)
            })
            .collect()
    })
}

/// One entry in the ordered transformation journal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransformationRecord {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_type: Option<String>,
}

/// Everything `normalize` produces: the typed dataset, its schema, the
/// transformation journal, and data-quality warnings.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub dataset: Dataset,
    pub schema: DatasetSchema,
    pub transformations: Vec<TransformationRecord>,
    pub warnings: Vec<String>,
}

/// Normalizes a raw dataset: standardizes headers, runs the coercion cascade
/// per column, applies domain rules, detects anomalies, and emits the schema.
pub fn normalize(dataset: &Dataset, settings: &Settings) -> Result<NormalizeOutcome, CoreError> {
    dataset.ensure_rectangular()?;

    let row_count = dataset.row_count();
    let (renamed, header_pairs) = standardize_headers(&dataset.columns);
    let mut transformations = vec![TransformationRecord {
        step: "header_standardization".to_string(),
        column: None,
        new_type: None,
    }];
    let mut warnings = Vec::new();

    let mut out_columns = Vec::with_capacity(renamed.len());
    let mut column_schemas = Vec::with_capacity(renamed.len());

    for (column, (name, original_name)) in renamed.into_iter().zip(header_pairs) {
        let coerced = coerce_column(&column, settings);
        if let Some(step) = coerced.step {
            transformations.push(TransformationRecord {
                step: step.to_string(),
                column: Some(name.clone()),
                new_type: Some(coerced.inferred_type.as_str().to_string()),
            });
            debug!("Column '{}' coerced via {}", name, step);
        }
        if coerced.decimal_convention == Some(DecimalConvention::Mixed) {
            warnings.push(format!(
                "Column '{name}' contains mixed decimal conventions (both US and EU formats)"
            ));
        }

        let typed = Column::new(name.clone(), coerced.cells);
        let anomalies = detect_anomalies(&typed, coerced.inferred_type, row_count, settings);

        if coerced.inferred_type == InferredType::Number {
            check_negative_policy(&typed, settings, &mut warnings);
        }

        let role = infer_role(coerced.inferred_type, anomalies.cardinality, row_count);
        column_schemas.push(ColumnSchema {
            name,
            original_name,
            inferred_type: coerced.inferred_type,
            role,
            cardinality: anomalies.cardinality,
            null_rate: anomalies.null_rate,
            coercions: coerced.counters,
            decimal_convention: coerced.decimal_convention,
            currencies_detected: coerced.currencies.clone(),
            multi_currency: coerced.currencies.len() > 1,
            representation: coerced.representation,
            anomalies,
        });
        out_columns.push(typed);
    }

    let currencies = DatasetSchema::currency_union(&column_schemas);
    let metadata = DatasetMetadata {
        row_count,
        column_count: out_columns.len(),
        multi_currency: currencies.len() > 1,
        currencies_detected: currencies,
        has_time_dimension: column_schemas
            .iter()
            .any(|c| c.role == ColumnRole::Datetime),
    };

    let columns_modified = transformations
        .iter()
        .filter_map(|t| t.column.as_ref())
        .collect::<BTreeSet<_>>()
        .len();
    let transformation_types = transformations
        .iter()
        .map(|t| t.step.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let schema = DatasetSchema {
        columns: column_schemas,
        metadata,
        warnings: warnings.clone(),
        transformations_summary: TransformationSummary {
            total_transformations: transformations.len(),
            columns_modified,
            transformation_types,
        },
        time: None,
    };

    Ok(NormalizeOutcome {
        dataset: Dataset::new(out_columns),
        schema,
        transformations,
        warnings,
    })
}

/// Trims, lowercases, replaces non-word characters with underscores, collapses
/// repeats, strips edges, and disambiguates duplicates with `_2`, `_3`, …
/// Returns the renamed columns and `(standardized, original)` name pairs.
fn standardize_headers(columns: &[Column]) -> (Vec<Column>, Vec<(String, String)>) {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut renamed = Vec::with_capacity(columns.len());
    let mut pairs = Vec::with_capacity(columns.len());

    for column in columns {
        let original = column.name.clone();
        let lowered = original.trim().to_lowercase();
        let replaced = non_word_re().replace_all(&lowered, "_");
        let collapsed = underscore_run_re().replace_all(&replaced, "_");
        let mut clean = collapsed.trim_matches('_').to_string();
        if clean.is_empty() {
            clean = "column".to_string();
        }
        if seen.contains(&clean) {
            let mut i = 2;
            while seen.contains(&format!("{clean}_{i}")) {
                i += 1;
            }
            clean = format!("{clean}_{i}");
        }
        seen.insert(clean.clone());
        renamed.push(Column::new(clean.clone(), column.values.clone()));
        pairs.push((clean, original));
    }
    (renamed, pairs)
}

struct ColumnCoercion {
    cells: Vec<Option<Cell>>,
    inferred_type: InferredType,
    counters: CoercionCounters,
    decimal_convention: Option<DecimalConvention>,
    currencies: Vec<String>,
    representation: Option<String>,
    step: Option<&'static str>,
}

impl ColumnCoercion {
    fn untouched(cells: Vec<Option<Cell>>, inferred_type: InferredType) -> Self {
        Self {
            cells,
            inferred_type,
            counters: CoercionCounters::default(),
            decimal_convention: None,
            currencies: Vec::new(),
            representation: None,
            step: None,
        }
    }
}

/// Runs the coercion cascade for one column: numeric → percent → datetime →
/// boolean. Columns already uniformly typed short-circuit without counters.
fn coerce_column(column: &Column, settings: &Settings) -> ColumnCoercion {
    if let Some(uniform) = uniform_type(column) {
        // A uniformly numeric column can still carry percent-scale values; the
        // header heuristic decides, exactly as for textual input.
        if uniform == InferredType::Number {
            if let Some(percent) = coerce_percent(column) {
                return percent;
            }
            let mut outcome = ColumnCoercion::untouched(column.values.clone(), uniform);
            if percent_header_re().is_match(&column.name) {
                outcome.representation = Some("percent".to_string());
                outcome.step = Some("percent_representation");
            }
            return outcome;
        }
        return ColumnCoercion::untouched(column.values.clone(), uniform);
    }

    if let Some(mut numeric) = coerce_numeric(column) {
        tag_percent_representation(&column.name, &mut numeric);
        return numeric;
    }
    if let Some(percent) = coerce_percent(column) {
        return percent;
    }
    if percent_header_re().is_match(&column.name) {
        // A percent-flavored header with nothing to normalize still records the
        // representation and ends the cascade, leaving values untouched.
        let mut outcome = ColumnCoercion::untouched(column.values.clone(), InferredType::Text);
        outcome.representation = Some("percent".to_string());
        outcome.step = Some("percent_representation");
        return outcome;
    }
    if let Some(datetime) = coerce_datetime(column) {
        return datetime;
    }
    if let Some(boolean) = coerce_boolean(column, settings) {
        return boolean;
    }

    ColumnCoercion::untouched(column.values.clone(), InferredType::Text)
}

/// Reports the column's type when every non-missing cell already shares one.
/// Text is excluded: textual columns are what the cascade exists for.
fn uniform_type(column: &Column) -> Option<InferredType> {
    let mut ty: Option<InferredType> = None;
    for cell in column.non_missing() {
        let observed = match cell {
            Cell::Number(_) => InferredType::Number,
            Cell::Timestamp(_) => InferredType::Timestamp,
            Cell::Boolean(_) => InferredType::Boolean,
            Cell::Text(_) => return None,
        };
        match ty {
            None => ty = Some(observed),
            Some(existing) if existing == observed => {}
            Some(_) => return None,
        }
    }
    ty
}

enum NumericParse {
    Plain(f64),
    Cleaned(f64),
    Failed,
}

/// Parses one raw token, applying the cleanup pipeline when a plain parse
/// fails: Unicode minus, currency symbols/codes, parenthesized and trailing
/// negatives, scale suffixes, separator stripping, and the US/EU decimal
/// disambiguation.
fn parse_numeric_text(
    raw: &str,
    counters: &mut CoercionCounters,
    currencies: &mut BTreeSet<String>,
    conventions: &mut BTreeSet<DecimalConvention>,
) -> NumericParse {
    let mut s = raw.trim().to_string();
    if let Ok(value) = s.parse::<f64>() {
        return NumericParse::Plain(value);
    }

    if s.contains('\u{2212}') {
        s = s.replace('\u{2212}', "-");
        counters.unicode_minus_normalized += 1;
    }

    if currency_symbol_re().is_match(&s) {
        for m in currency_symbol_re().find_iter(&s) {
            currencies.insert(m.as_str().to_string());
        }
        s = currency_symbol_re().replace_all(&s, "").into_owned();
        counters.currency_removed += 1;
    }
    if let Some(m) = currency_code_re().find(&s) {
        currencies.insert(m.as_str().to_string());
        s = currency_code_re().replace_all(&s, "").into_owned();
        counters.currency_removed += 1;
    }

    let parenthesized = {
        let trimmed = s.trim();
        if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() > 2 {
            Some(format!("-{}", &trimmed[1..trimmed.len() - 1]))
        } else {
            None
        }
    };
    if let Some(negated) = parenthesized {
        s = negated;
        counters.parentheses_to_negative += 1;
    }

    let trailing_minus = {
        let trimmed = s.trim();
        if trimmed.len() > 1 && trimmed.ends_with('-') {
            Some(format!("-{}", &trimmed[..trimmed.len() - 1]))
        } else {
            None
        }
    };
    if let Some(negated) = trailing_minus {
        s = negated;
    }

    let mut scale = 1.0;
    let suffix_match = scale_suffix_res().iter().find_map(|(re, multiplier)| {
        re.captures(s.trim())
            .map(|caps| (caps[1].to_string(), *multiplier))
    });
    if let Some((body, multiplier)) = suffix_match {
        s = body;
        scale = multiplier;
        counters.scaling_applied += 1;
    }

    s.retain(|c| !c.is_whitespace() && c != '\'');

    if s.contains('.') && s.contains(',') {
        // The rightmost separator is the decimal point.
        if s.rfind('.') > s.rfind(',') {
            s = s.replace(',', "");
            conventions.insert(DecimalConvention::Us);
        } else {
            s = s.replace('.', "").replace(',', ".");
            conventions.insert(DecimalConvention::Eu);
        }
    } else if s.contains(',') {
        // Comma is a decimal separator only with 1-2 trailing digits.
        if comma_decimal_re().is_match(&s) {
            s = s.replace(',', ".");
            conventions.insert(DecimalConvention::Eu);
        } else {
            s = s.replace(',', "");
            conventions.insert(DecimalConvention::Us);
        }
    }

    match s.parse::<f64>() {
        Ok(value) => {
            counters.successful_coercions += 1;
            NumericParse::Cleaned(value * scale)
        }
        Err(_) => {
            counters.failed_coercions += 1;
            NumericParse::Failed
        }
    }
}

/// Numeric strategy. Claims the column only when at least one value needed
/// cleanup: plainly numeric text is the loader's job, and counting it here
/// would steal textual boolean columns from the boolean strategy.
fn coerce_numeric(column: &Column) -> Option<ColumnCoercion> {
    let mut counters = CoercionCounters::default();
    let mut currencies = BTreeSet::new();
    let mut conventions = BTreeSet::new();
    let mut cells = Vec::with_capacity(column.values.len());
    let mut cleaned_any = false;

    for value in &column.values {
        let cell = match value {
            None => None,
            Some(Cell::Number(n)) => Some(Cell::Number(*n)),
            Some(Cell::Text(s)) => {
                match parse_numeric_text(s, &mut counters, &mut currencies, &mut conventions) {
                    NumericParse::Plain(v) => Some(Cell::Number(v)),
                    NumericParse::Cleaned(v) => {
                        cleaned_any = true;
                        Some(Cell::Number(v))
                    }
                    NumericParse::Failed => None,
                }
            }
            Some(_) => {
                counters.failed_coercions += 1;
                None
            }
        };
        cells.push(cell);
    }

    if !cleaned_any {
        return None;
    }

    let decimal_convention = match conventions.len() {
        0 => None,
        1 => conventions.into_iter().next(),
        _ => Some(DecimalConvention::Mixed),
    };

    Some(ColumnCoercion {
        cells,
        inferred_type: InferredType::Number,
        counters,
        decimal_convention,
        currencies: currencies.into_iter().collect(),
        representation: None,
        step: Some("numeric_coercion"),
    })
}

/// After a successful numeric coercion, a percent-flavored header tags the
/// representation without rescaling anything.
fn tag_percent_representation(name: &str, outcome: &mut ColumnCoercion) {
    if percent_header_re().is_match(name) {
        outcome.representation = Some("percent".to_string());
    }
}

/// Percent strategy: explicit trailing `%` always divides by 100; a
/// percent-flavored header additionally rescales bare values in (1, 100].
/// Values at or below 1 are never rescaled.
fn coerce_percent(column: &Column) -> Option<ColumnCoercion> {
    let header_match = percent_header_re().is_match(&column.name);
    let mut counters = CoercionCounters::default();
    let mut cells = Vec::with_capacity(column.values.len());

    for value in &column.values {
        let cell = match value {
            None => None,
            Some(Cell::Number(n)) => {
                if header_match && *n > 1.0 && *n <= 100.0 {
                    counters.percent_normalized += 1;
                    Some(Cell::Number(*n / 100.0))
                } else {
                    Some(Cell::Number(*n))
                }
            }
            Some(Cell::Text(s)) => {
                let trimmed = s.trim();
                if let Some(body) = trimmed.strip_suffix('%') {
                    match body.trim().parse::<f64>() {
                        Ok(v) => {
                            counters.percent_normalized += 1;
                            Some(Cell::Number(v / 100.0))
                        }
                        Err(_) => {
                            counters.failed_coercions += 1;
                            None
                        }
                    }
                } else if let Ok(v) = trimmed.parse::<f64>() {
                    if header_match && v > 1.0 && v <= 100.0 {
                        counters.percent_normalized += 1;
                        Some(Cell::Number(v / 100.0))
                    } else {
                        Some(Cell::Number(v))
                    }
                } else {
                    counters.failed_coercions += 1;
                    None
                }
            }
            Some(_) => {
                counters.failed_coercions += 1;
                None
            }
        };
        cells.push(cell);
    }

    if counters.percent_normalized == 0 {
        return None;
    }

    Some(ColumnCoercion {
        cells,
        inferred_type: InferredType::Number,
        counters,
        decimal_convention: None,
        currencies: Vec::new(),
        representation: Some("percent".to_string()),
        step: Some("percent_normalization"),
    })
}

/// Datetime strategy, gated on a temporal-flavored header. Unparsable values
/// become missing, never an error.
fn coerce_datetime(column: &Column) -> Option<ColumnCoercion> {
    if !temporal_header_re().is_match(&column.name) {
        return None;
    }

    let mut counters = CoercionCounters::default();
    let mut cells = Vec::with_capacity(column.values.len());

    for value in &column.values {
        let cell = match value {
            None => None,
            Some(Cell::Timestamp(ts)) => Some(Cell::Timestamp(*ts)),
            Some(Cell::Text(s)) => match crate::data::parse_timestamp(s) {
                Some(ts) => {
                    counters.datetime_parsed += 1;
                    Some(Cell::Timestamp(ts))
                }
                None => {
                    counters.failed_coercions += 1;
                    None
                }
            },
            Some(_) => {
                counters.failed_coercions += 1;
                None
            }
        };
        cells.push(cell);
    }

    if counters.datetime_parsed == 0 {
        return None;
    }

    Some(ColumnCoercion {
        cells,
        inferred_type: InferredType::Timestamp,
        counters,
        decimal_convention: None,
        currencies: Vec::new(),
        representation: None,
        step: Some("datetime_coercion"),
    })
}

fn boolean_token(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" => Some(true),
        "no" | "n" | "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

/// Boolean strategy. Conservative: a bounded sample must be predominantly
/// boolean-like before anything is coerced, and textual `1`/`0` qualify while
/// numeric cells never do.
fn coerce_boolean(column: &Column, settings: &Settings) -> Option<ColumnCoercion> {
    let sample: Vec<&Cell> = column
        .non_missing()
        .take(settings.boolean_sample_limit)
        .collect();
    if sample.is_empty() {
        return None;
    }
    let boolean_like = sample
        .iter()
        .filter(|cell| match cell {
            Cell::Boolean(_) => true,
            Cell::Text(s) => BOOLEAN_TOKENS.contains(&s.trim().to_ascii_lowercase().as_str()),
            _ => false,
        })
        .count();
    if (boolean_like as f64) / (sample.len() as f64) < settings.boolean_ratio {
        return None;
    }

    let mut counters = CoercionCounters::default();
    let mut cells = Vec::with_capacity(column.values.len());
    for value in &column.values {
        let cell = match value {
            None => None,
            Some(Cell::Boolean(b)) => {
                counters.boolean_coerced += 1;
                Some(Cell::Boolean(*b))
            }
            Some(Cell::Text(s)) => match boolean_token(s) {
                Some(b) => {
                    counters.boolean_coerced += 1;
                    Some(Cell::Boolean(b))
                }
                None => {
                    counters.failed_coercions += 1;
                    None
                }
            },
            Some(_) => {
                counters.failed_coercions += 1;
                None
            }
        };
        cells.push(cell);
    }

    if counters.boolean_coerced == 0 {
        return None;
    }

    Some(ColumnCoercion {
        cells,
        inferred_type: InferredType::Boolean,
        counters,
        decimal_convention: None,
        currencies: Vec::new(),
        representation: None,
        step: Some("boolean_coercion"),
    })
}

/// Flags number columns containing negatives unless the name carries an
/// allow-listed term (built-in list plus the configurable extension).
fn check_negative_policy(column: &Column, settings: &Settings, warnings: &mut Vec<String>) {
    let negatives = column
        .non_missing()
        .filter_map(Cell::as_number)
        .filter(|v| *v < 0.0)
        .count();
    if negatives == 0 {
        return;
    }
    let name = column.name.to_lowercase();
    let allowed = NEGATIVE_ALLOWED_TERMS
        .iter()
        .any(|term| name.contains(term))
        || settings
            .negative_allowed_columns
            .iter()
            .any(|term| name.contains(term.as_str()));
    if !allowed {
        warnings.push(format!(
            "Unexpected negative values in '{}': {} occurrences",
            column.name, negatives
        ));
    }
}

fn detect_anomalies(
    column: &Column,
    inferred_type: InferredType,
    row_count: usize,
    settings: &Settings,
) -> ColumnAnomalies {
    let null_count = column.null_count();
    let null_rate = if row_count > 0 {
        null_count as f64 / row_count as f64
    } else {
        0.0
    };

    let mut distinct: BTreeSet<String> = BTreeSet::new();
    for cell in column.non_missing() {
        distinct.insert(cell.as_display());
    }
    let cardinality = distinct.len();

    let mut anomalies = ColumnAnomalies {
        null_count,
        null_rate,
        high_null_rate: null_rate > settings.high_null_rate,
        outlier_count: None,
        outlier_rate: None,
        cardinality,
        low_cardinality: row_count > 100 && cardinality < 5,
    };

    if inferred_type == InferredType::Number {
        let values: Vec<f64> = column.non_missing().filter_map(Cell::as_number).collect();
        if values.len() >= 2 {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance =
                values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
            let std_dev = variance.max(0.0).sqrt();
            if std_dev > 0.0 {
                let outliers = values
                    .iter()
                    .filter(|v| (**v - mean).abs() > 3.0 * std_dev)
                    .count();
                if outliers > 0 {
                    anomalies.outlier_count = Some(outliers);
                    anomalies.outlier_rate = Some(outliers as f64 / values.len() as f64);
                }
            }
        }
    }

    anomalies
}

/// Number columns are `numeric` above an adaptive cardinality threshold,
/// otherwise `categorical`. Timestamps are `datetime`; everything else is
/// `categorical`.
fn infer_role(inferred_type: InferredType, cardinality: usize, row_count: usize) -> ColumnRole {
    match inferred_type {
        InferredType::Number => {
            let threshold = (row_count / 10).clamp(5, 50);
            if cardinality > threshold || cardinality as f64 > row_count as f64 * 0.5 {
                ColumnRole::Numeric
            } else {
                ColumnRole::Categorical
            }
        }
        InferredType::Timestamp => ColumnRole::Datetime,
        InferredType::Text | InferredType::Boolean => ColumnRole::Categorical,
    }
}

/// Groups transformation records by step for summary display.
pub fn summarize_steps(records: &[TransformationRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.step.clone()).or_insert(0) += 1;
    }
    counts
}
