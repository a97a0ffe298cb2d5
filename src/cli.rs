use std::path::PathBuf;

use anyhow::{Result, anyhow, ensure};
use clap::{Args, Parser, Subcommand};

/// Upper bound on thresholds per analysis request, enforced at this boundary
/// so the analyzer can assume a validated list.
pub const MAX_THRESHOLDS: usize = 10;

#[derive(Debug, Parser)]
#[command(author, version, about = "Deterministic Pareto analytics for tabular business data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize a CSV file: standardize headers, coerce types, emit a schema
    Normalize(NormalizeArgs),
    /// Run concentration analysis over a CSV file, per period when a time
    /// dimension is present
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination schema JSON path
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Output CSV file for the normalized dataset
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Settings YAML overriding pipeline defaults
    #[arg(long = "settings")]
    pub settings: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Skip time dimension detection
    #[arg(long = "no-time")]
    pub no_time: bool,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Column to group by
    #[arg(short = 'g', long = "group-by")]
    pub group_by: String,
    /// Numeric column to aggregate
    #[arg(short = 'v', long = "value")]
    pub value: String,
    /// Concentration thresholds as percentages in 1..=100
    #[arg(short = 't', long = "thresholds", value_delimiter = ',')]
    pub thresholds: Vec<u32>,
    /// Output JSON path (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Settings YAML overriding pipeline defaults
    #[arg(long = "settings")]
    pub settings: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Analyze the dataset as a single period even when a time dimension is
    /// detected
    #[arg(long = "no-time")]
    pub no_time: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

/// Validates the caller-boundary threshold contract: range-checked,
/// deduplicated, sorted ascending, bounded in count. Falls back to the
/// configured defaults when no thresholds were supplied.
pub fn validate_thresholds(requested: &[u32], defaults: &[u32]) -> Result<Vec<u32>> {
    let source = if requested.is_empty() {
        defaults
    } else {
        requested
    };
    for threshold in source {
        ensure!(
            (1..=100).contains(threshold),
            "Threshold {threshold} is outside 1..=100"
        );
    }
    let mut thresholds = source.to_vec();
    thresholds.sort_unstable();
    thresholds.dedup();
    if thresholds.len() > MAX_THRESHOLDS {
        return Err(anyhow!(
            "Too many thresholds: {} supplied, at most {MAX_THRESHOLDS} allowed",
            thresholds.len()
        ));
    }
    Ok(thresholds)
}
