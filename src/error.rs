use thiserror::Error;

/// Caller-contract violations surfaced at the library boundary.
///
/// Data-quality problems (unparsable values, empty groups, non-positive totals)
/// never appear here; they are reported inside the normal return structures as
/// warnings, anomaly flags, or per-period error entries.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("column '{0}' not found in dataset")]
    ColumnNotFound(String),
    #[error("dataset is ragged: column '{column}' has {actual} value(s), expected {expected}")]
    RaggedDataset {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("period grain '{grain}' requires a '{role}' derivation column")]
    MissingDerivation { grain: String, role: String },
}
