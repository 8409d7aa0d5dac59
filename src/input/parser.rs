//! Characteristic (YAML) and measurement (CSV) parsing

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::measurement::{Characteristic, Measurement};
use crate::input::diagnostics::{InputError, InputSyntaxError};

/// Row layout of a measurement CSV file
#[derive(Debug, Deserialize)]
struct MeasurementRow {
    value: f64,
    timestamp: DateTime<Utc>,
    #[serde(default, alias = "subgroup_number")]
    subgroup: Option<u32>,
    #[serde(default)]
    id: Option<String>,
}

impl From<MeasurementRow> for Measurement {
    fn from(row: MeasurementRow) -> Self {
        Measurement {
            value: row.value,
            timestamp: row.timestamp,
            subgroup_number: row.subgroup,
            id: row.id.filter(|s| !s.is_empty()),
        }
    }
}

/// Parse a characteristic YAML document
pub fn parse_characteristic(content: &str, filename: &str) -> Result<Characteristic, InputError> {
    let characteristic: Characteristic = serde_yml::from_str(content)
        .map_err(|e| InputSyntaxError::from_yaml_error(&e, content, filename))?;
    check_finite(&characteristic.measurements, content, filename, |index| {
        yaml_value_line(content, index)
    })?;
    Ok(characteristic)
}

/// Parse a measurement CSV file
pub fn parse_measurements_csv(content: &str, filename: &str) -> Result<Vec<Measurement>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let syntax = |e: csv::Error| InputSyntaxError::from_csv_error(&e, content, filename);
    let headers = reader.headers().map_err(syntax)?.clone();

    let mut measurements = Vec::new();
    let mut lines = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record).map_err(syntax)? {
        let row: MeasurementRow = record.deserialize(Some(&headers)).map_err(syntax)?;
        measurements.push(Measurement::from(row));
        lines.push(record.position().map(|p| p.line() as usize));
    }

    check_finite(&measurements, content, filename, |index| {
        lines.get(index).copied().flatten()
    })?;
    Ok(measurements)
}

/// Load a characteristic file from disk
pub fn load_characteristic(path: &Path) -> Result<Characteristic, InputError> {
    let content = read(path)?;
    parse_characteristic(&content, &path.display().to_string())
}

/// Load measurements from a CSV file or from a characteristic file's
/// `measurements` list
pub fn load_measurements(path: &Path) -> Result<Vec<Measurement>, InputError> {
    match InputKind::of(path)? {
        InputKind::Csv => {
            let content = read(path)?;
            parse_measurements_csv(&content, &path.display().to_string())
        }
        InputKind::Characteristic => Ok(load_characteristic(path)?.measurements),
    }
}

/// Kind of input file, by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Csv,
    Characteristic,
}

impl InputKind {
    pub fn of(path: &Path) -> Result<Self, InputError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(InputKind::Csv),
            Some("yaml") | Some("yml") => Ok(InputKind::Characteristic),
            _ => Err(InputError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

fn read(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Reject NaN/inf values, pointing at the offending line when `line_of`
/// can place the measurement
fn check_finite(
    measurements: &[Measurement],
    content: &str,
    filename: &str,
    line_of: impl Fn(usize) -> Option<usize>,
) -> Result<(), InputError> {
    let Some((index, bad)) = measurements
        .iter()
        .enumerate()
        .find(|(_, m)| !m.value.is_finite())
    else {
        return Ok(());
    };

    let message = format!(
        "Measurement #{} in {} has a non-finite value ({})",
        index + 1,
        filename,
        bad.value
    );
    let line = line_of(index).unwrap_or(1);
    Err(InputSyntaxError::at_line(message, content, filename, line).into())
}

/// 1-based line of the `index`-th `value:` key in a block-style YAML document
fn yaml_value_line(content: &str, index: usize) -> Option<usize> {
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| {
            let key = l.trim_start();
            let key = key.strip_prefix('-').map(str::trim_start).unwrap_or(key);
            key.starts_with("value:")
        })
        .nth(index)
        .map(|(i, _)| i + 1)
}
