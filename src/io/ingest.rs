//! CSV ingest of recorded slug-test responses.
//!
//! A record file is a flat table with an elapsed-time column and a head
//! column (names configurable, defaults `time` / `head`). Extra columns are
//! ignored. Rows with missing or non-numeric values are skipped and reported;
//! a file with no usable rows is a data-quality error.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::error::AppError;

/// Column names to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub time: String,
    pub head: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            time: "time".to_string(),
            head: "head".to_string(),
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output.
#[derive(Debug, Clone)]
pub struct IngestedRecord {
    pub time: Vec<f64>,
    pub head: Vec<f64>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a record from a CSV file.
pub fn load_slug_csv(path: &Path, columns: &ColumnSpec) -> Result<IngestedRecord, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let record = read_slug_csv(file, columns)?;
    debug!(
        path = %path.display(),
        rows = record.rows_read,
        used = record.time.len(),
        "record loaded"
    );
    Ok(record)
}

/// Parse a record from any CSV source.
pub fn read_slug_csv<R: Read>(source: R, columns: &ColumnSpec) -> Result<IngestedRecord, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    for name in [&columns.time, &columns.head] {
        if !header_map.contains_key(&normalize_header_name(name)) {
            return Err(AppError::config(format!("Missing required column: `{name}`")));
        }
    }

    let mut time = Vec::new();
    let mut head = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &header_map, columns));
        match parsed {
            Ok((t, h)) => {
                time.push(t);
                head.push(h);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), "skipped unreadable rows");
    }
    if time.is_empty() {
        return Err(AppError::data("No valid time/head rows in the record."));
    }

    Ok(IngestedRecord {
        time,
        head,
        row_errors,
        rows_read,
    })
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    columns: &ColumnSpec,
) -> Result<(f64, f64), String> {
    let t = parse_f64(get_required(record, header_map, &columns.time)?, &columns.time)?;
    let h = parse_f64(get_required(record, header_map, &columns.head)?, &columns.head)?;
    Ok((t, h))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(&normalize_header_name(name))
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid number '{s}' in `{name}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_columns_and_skips_bad_rows() {
        let csv = "\u{feff}Time,Head,temp\n0,1.5,12\n1,1.2,12\n2,,12\n3,abc,12\n4,0.9,12\n";
        let rec = read_slug_csv(csv.as_bytes(), &ColumnSpec::default()).unwrap();
        assert_eq!(rec.time, vec![0.0, 1.0, 4.0]);
        assert_eq!(rec.head, vec![1.5, 1.2, 0.9]);
        assert_eq!(rec.rows_read, 5);
        assert_eq!(rec.row_errors.len(), 2);
        assert_eq!(rec.row_errors[0].line, 4);
    }

    #[test]
    fn custom_column_names() {
        let csv = "elapsed_s,wl_m\n0.0,3.0\n0.5,2.5\n";
        let columns = ColumnSpec {
            time: "elapsed_s".to_string(),
            head: "wl_m".to_string(),
        };
        let rec = read_slug_csv(csv.as_bytes(), &columns).unwrap();
        assert_eq!(rec.head, vec![3.0, 2.5]);
    }

    #[test]
    fn missing_column_is_a_configuration_error() {
        let err = read_slug_csv("t,h\n0,1\n".as_bytes(), &ColumnSpec::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn no_usable_rows_is_a_data_error() {
        let err = read_slug_csv("time,head\n0,x\n".as_bytes(), &ColumnSpec::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataQuality);
    }
}
