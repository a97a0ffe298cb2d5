use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Tunable knobs for the analytics pipeline. Every field has a sensible
/// default, so a settings file only needs to override what it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Thresholds applied when an analysis request does not supply its own.
    pub default_thresholds: Vec<u32>,
    /// Inclusive bounds for a plausible calendar year.
    pub year_range: (i64, i64),
    /// Fraction of sampled values that must validate for a column to qualify
    /// as a temporal candidate.
    pub time_validation_threshold: f64,
    /// Extension of the built-in allow-list of column-name terms where
    /// negative values are legitimate.
    pub negative_allowed_columns: Vec<String>,
    /// Upper bound on the number of values sampled for boolean detection.
    pub boolean_sample_limit: usize,
    /// Fraction of sampled values that must look boolean-like before boolean
    /// coercion is attempted.
    pub boolean_ratio: f64,
    /// Null rate above which a column is flagged.
    pub high_null_rate: f64,
    /// Maximum rows retained in each period's head sample.
    pub head_sample_limit: usize,
    /// Maximum group identifiers retained per threshold for display.
    pub entity_sample_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_thresholds: vec![10, 20, 50],
            year_range: (1900, 2100),
            time_validation_threshold: 0.7,
            negative_allowed_columns: vec![
                "discount".to_string(),
                "returns".to_string(),
                "refund".to_string(),
                "adjustment".to_string(),
                "delta".to_string(),
                "change".to_string(),
            ],
            boolean_sample_limit: 100,
            boolean_ratio: 0.7,
            high_null_rate: 0.5,
            head_sample_limit: 20,
            entity_sample_limit: 10,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening settings file {path:?}"))?;
        let reader = BufReader::new(file);
        let settings: Settings =
            serde_yaml::from_reader(reader).context("Parsing settings YAML")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.default_thresholds.is_empty(),
            "Settings must define at least one default threshold"
        );
        ensure!(
            self.default_thresholds.iter().all(|t| (1..=100).contains(t)),
            "Default thresholds must lie in 1..=100"
        );
        ensure!(
            self.year_range.0 <= self.year_range.1,
            "year_range lower bound exceeds upper bound"
        );
        ensure!(
            (0.0..=1.0).contains(&self.time_validation_threshold),
            "time_validation_threshold must lie in [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&self.boolean_ratio),
            "boolean_ratio must lie in [0, 1]"
        );
        Ok(())
    }
}
