use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::{Cell, Column, Dataset};

pub const DEFAULT_DELIMITER: u8 = b',';

/// Picks a delimiter: explicit flag wins, then the file extension, then comma.
pub fn resolve_delimiter(path: &Path, explicit: Option<u8>) -> u8 {
    if let Some(delimiter) = explicit {
        return delimiter;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsv") | Some("tab") => b'\t',
        _ => DEFAULT_DELIMITER,
    }
}

/// Reads a CSV file into a raw in-memory dataset.
///
/// Cells that parse as plain finite numbers are pre-typed as numbers, the way
/// the upstream frame loaders this pipeline was built against behave; every
/// other non-empty cell stays text for the normalizer's coercion cascade.
pub fn read_dataset(path: &Path, delimiter: u8) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Opening CSV file {path:?}"))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut columns: Vec<Vec<Option<Cell>>> = vec![Vec::new(); headers.len()];

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let field = record.get(col_idx).unwrap_or("");
            column.push(pre_type(field));
        }
    }

    let columns = headers
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Dataset::new(columns))
}

fn pre_type(field: &str) -> Option<Cell> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() {
            return Some(Cell::Number(value));
        }
        return None;
    }
    Some(Cell::Text(field.to_string()))
}

/// Writes a dataset as CSV, rendering missing cells as empty fields.
pub fn write_dataset_csv(dataset: &Dataset, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Creating output CSV {path:?}"))?;

    let headers: Vec<&str> = dataset.columns.iter().map(|c| c.name.as_str()).collect();
    writer.write_record(&headers).context("Writing CSV header")?;

    for row in 0..dataset.row_count() {
        let record: Vec<String> = dataset
            .columns
            .iter()
            .map(|column| {
                column.values[row]
                    .as_ref()
                    .map(Cell::as_display)
                    .unwrap_or_default()
            })
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("Writing row {}", row + 2))?;
    }
    writer.flush().context("Flushing output CSV")?;
    Ok(())
}

/// Writes any serializable artifact as pretty-printed JSON.
pub fn write_json_pretty<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating JSON file {path:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).context("Writing JSON")?;
    writer.write_all(b"\n").context("Finishing JSON file")?;
    Ok(())
}
