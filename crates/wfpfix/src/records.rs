use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use wfpfix_core::{ReferenceRecord, Sample};

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const STREAM_COLUMN: &str = "stream";

/// Target samples read from CSV; each sample keeps its full row as payload so
/// it can be written back with only the timestamp replaced.
#[derive(Debug, Clone)]
pub struct TargetTable {
    pub headers: StringRecord,
    pub timestamp_index: usize,
    pub samples: Vec<Sample<StringRecord>>,
}

pub fn read_targets(path: &Path, value_column: &str) -> Result<TargetTable> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open target file {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let timestamp_index = column_index(&headers, TIMESTAMP_COLUMN)
        .ok_or_else(|| anyhow!("{} has no '{TIMESTAMP_COLUMN}' column", path.display()))?;
    let value_index = column_index(&headers, value_column)
        .ok_or_else(|| anyhow!("{} has no '{value_column}' column", path.display()))?;

    let mut samples = Vec::new();
    for (line_index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("target row {line_index} unreadable"))?;
        let timestamp = parse_field(&row, timestamp_index, line_index)?;
        let value = parse_field(&row, value_index, line_index)?;
        samples.push(Sample::new(timestamp, value, row));
    }

    Ok(TargetTable {
        headers,
        timestamp_index,
        samples,
    })
}

/// One reference row. Rows from files without a `stream` column belong to
/// `default_stream`.
#[derive(Debug, Clone)]
pub struct CsvReferenceRecord {
    stream: String,
    timestamp: f64,
    fields: HashMap<String, f64>,
}

impl ReferenceRecord for CsvReferenceRecord {
    fn stream(&self) -> &str {
        &self.stream
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }
}

/// Lazily reads reference rows. A malformed row ends the stream with an error
/// item so extraction keeps what came before it.
pub fn read_reference(
    path: &Path,
    default_stream: &str,
) -> Result<impl Iterator<Item = Result<CsvReferenceRecord>>> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open reference file {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let timestamp_index = column_index(&headers, TIMESTAMP_COLUMN)
        .ok_or_else(|| anyhow!("{} has no '{TIMESTAMP_COLUMN}' column", path.display()))?;
    let stream_index = column_index(&headers, STREAM_COLUMN);
    let default_stream = default_stream.to_string();

    Ok(reader
        .into_records()
        .enumerate()
        .map(move |(line_index, row)| {
            let row = row.with_context(|| format!("reference row {line_index} unreadable"))?;
            let timestamp = parse_field(&row, timestamp_index, line_index)?;
            let stream = stream_index
                .and_then(|index| row.get(index))
                .map(str::to_string)
                .unwrap_or_else(|| default_stream.clone());

            let fields = headers
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != timestamp_index && Some(*index) != stream_index)
                .filter_map(|(index, name)| {
                    let value = row.get(index)?.parse::<f64>().ok()?;
                    Some((name.to_string(), value))
                })
                .collect();

            Ok(CsvReferenceRecord {
                stream,
                timestamp,
                fields,
            })
        }))
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

fn parse_field(row: &StringRecord, index: usize, line_index: usize) -> Result<f64> {
    let raw = row
        .get(index)
        .ok_or_else(|| anyhow!("row {line_index} is missing column {index}"))?;
    raw.parse::<f64>()
        .with_context(|| format!("row {line_index} column {index}: '{raw}' is not a number"))
}
