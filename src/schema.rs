//! Schema records emitted by normalization and extended by time detection.
//!
//! The [`DatasetSchema`] is created exactly once per normalization pass and is
//! immutable afterwards, with one sanctioned exception: the time dimension
//! detector appends its findings via [`DatasetSchema::apply_time_detection`].
//! No other mutation path exists.

use std::collections::BTreeSet;
use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::timedim::TimeInfo;

/// Semantic type of a normalized column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    Text,
    Number,
    Timestamp,
    Boolean,
}

impl InferredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::Text => "text",
            InferredType::Number => "number",
            InferredType::Timestamp => "timestamp",
            InferredType::Boolean => "boolean",
        }
    }
}

/// Analytical role a column plays downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Numeric,
    Categorical,
    Datetime,
}

/// Decimal-separator convention observed while coercing a column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecimalConvention {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "mixed")]
    Mixed,
}

/// Per-column tally of every change the normalizer applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoercionCounters {
    pub successful_coercions: usize,
    pub failed_coercions: usize,
    pub currency_removed: usize,
    pub parentheses_to_negative: usize,
    pub scaling_applied: usize,
    pub unicode_minus_normalized: usize,
    pub percent_normalized: usize,
    pub datetime_parsed: usize,
    pub boolean_coerced: usize,
}

impl CoercionCounters {
    pub fn any_applied(&self) -> bool {
        self.successful_coercions > 0
            || self.percent_normalized > 0
            || self.datetime_parsed > 0
            || self.boolean_coerced > 0
    }
}

/// Data-quality findings for one column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnAnomalies {
    pub null_count: usize,
    pub null_rate: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub high_null_rate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_rate: Option<f64>,
    pub cardinality: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub low_cardinality: bool,
}

/// One record per column, created once per normalization pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub original_name: String,
    pub inferred_type: InferredType,
    pub role: ColumnRole,
    pub cardinality: usize,
    pub null_rate: f64,
    pub coercions: CoercionCounters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_convention: Option<DecimalConvention>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub currencies_detected: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub multi_currency: bool,
    /// `"percent"` when the column carries percent-style values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
    pub anomalies: ColumnAnomalies,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetMetadata {
    pub row_count: usize,
    pub column_count: usize,
    pub multi_currency: bool,
    pub currencies_detected: Vec<String>,
    pub has_time_dimension: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransformationSummary {
    pub total_transformations: usize,
    pub columns_modified: usize,
    pub transformation_types: Vec<String>,
}

/// Time-detection fields appended onto the schema after normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeFields {
    pub period_grain: String,
    pub period_grain_candidates: Vec<String>,
    pub time_candidates: Vec<String>,
    pub selected_time_columns: Vec<(String, String)>,
    pub derivations: Vec<(String, String)>,
    pub time_warnings: Vec<String>,
}

/// Dataset-level schema: one [`ColumnSchema`] per column plus metadata,
/// warnings, and a transformation summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSchema {
    pub columns: Vec<ColumnSchema>,
    pub metadata: DatasetMetadata,
    pub warnings: Vec<String>,
    pub transformations_summary: TransformationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeFields>,
}

impl DatasetSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Union of currencies seen across all columns, sorted for determinism.
    pub fn currency_union(columns: &[ColumnSchema]) -> Vec<String> {
        let set: BTreeSet<String> = columns
            .iter()
            .flat_map(|c| c.currencies_detected.iter().cloned())
            .collect();
        set.into_iter().collect()
    }

    /// Appends time-detection results. The only mutation the schema admits
    /// after creation.
    pub fn apply_time_detection(&mut self, info: &TimeInfo) {
        self.time = Some(TimeFields {
            period_grain: info.period_grain.as_str().to_string(),
            period_grain_candidates: info
                .period_grain_candidates
                .iter()
                .map(|g| g.as_str().to_string())
                .collect(),
            time_candidates: info.time_candidates.clone(),
            selected_time_columns: info
                .selected_time_columns
                .iter()
                .map(|(role, col)| (role.clone(), col.clone()))
                .collect(),
            derivations: info.derivations.as_pairs(),
            time_warnings: info.warnings.clone(),
        });
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing schema JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema = serde_json::from_reader(reader).context("Parsing schema JSON")?;
        Ok(schema)
    }
}
