//! Dataset loaders for CSV and JSON files
//!
//! Semantic types are decided here, once, from the raw cell text. Everything
//! downstream trusts the declared `SemanticType` of each column.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use regex::Regex;
use tracing::debug;

use crate::dataset::{Column, Dataset, SemanticType, Value};
use crate::error::{Error, Result};

/// Date-time formats tried when inferring datetime columns
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Date-only formats tried when inferring datetime columns
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Supported input file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// Detect the format from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            _ => Err(Error::UnsupportedFormat(format!(
                "{} (expected .csv or .json)",
                path.display()
            ))),
        }
    }
}

/// Load a dataset from a file, choosing the parser by extension
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let format = FileFormat::from_path(path)?;
    let reader = BufReader::new(File::open(path)?);

    let dataset = match format {
        FileFormat::Csv => parse_csv(reader)?,
        FileFormat::Json => parse_json(reader)?,
    };

    debug!(
        path = %path.display(),
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "Loaded dataset"
    );
    Ok(dataset)
}

/// Parse CSV with a header row
///
/// Short records are padded with empty (missing) cells.
pub fn parse_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for result in rdr.records() {
        let record = result?;
        for (i, column) in cells.iter_mut().enumerate() {
            column.push(record.get(i).unwrap_or("").to_string());
        }
    }

    build_dataset(headers, cells)
}

/// Parse a JSON array of flat records
///
/// Columns follow first-seen key order; keys absent from a record are missing.
pub fn parse_json<R: Read>(reader: R) -> Result<Dataset> {
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    let records = value
        .as_array()
        .ok_or_else(|| Error::InvalidData("Expected a JSON array of records".into()))?;

    let mut headers: Vec<String> = Vec::new();
    for record in records {
        let object = record.as_object().ok_or_else(|| {
            Error::InvalidData("Expected every JSON record to be an object".into())
        })?;
        for key in object.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(records.len()); headers.len()];
    for record in records {
        // Checked above
        let Some(object) = record.as_object() else {
            continue;
        };
        for (header, column) in headers.iter().zip(cells.iter_mut()) {
            let raw = match object.get(header) {
                None | Some(serde_json::Value::Null) => String::new(),
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            column.push(raw);
        }
    }

    build_dataset(headers, cells)
}

fn build_dataset(headers: Vec<String>, cells: Vec<Vec<String>>) -> Result<Dataset> {
    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| infer_column(name, &raw))
        .collect();
    Dataset::new(columns)
}

/// Build a typed column from raw cell text
///
/// Every non-missing cell must agree for a type to be chosen, checked in the
/// order boolean, numeric, datetime. Anything else (including an all-missing
/// column) is categorical.
pub fn infer_column(name: impl Into<String>, raw: &[String]) -> Column {
    let name = name.into();
    let present: Vec<&str> = raw
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let semantic_type = if present.is_empty() {
        SemanticType::Categorical
    } else if present.iter().all(|s| parse_bool(s).is_some()) {
        SemanticType::Boolean
    } else if present.iter().all(|s| parse_number(s).is_some()) {
        SemanticType::Numeric
    } else if present.iter().all(|s| parse_datetime(s).is_some()) {
        SemanticType::Datetime
    } else {
        SemanticType::Categorical
    };

    let values = raw
        .iter()
        .map(|cell| {
            let cell = cell.trim();
            if cell.is_empty() {
                return Value::Null;
            }
            match semantic_type {
                SemanticType::Boolean => parse_bool(cell).map(Value::Bool),
                SemanticType::Numeric => parse_number(cell).map(Value::Number),
                SemanticType::Datetime => parse_datetime(cell).map(Value::DateTime),
                SemanticType::Categorical => Some(Value::Text(cell.to_string())),
            }
            .unwrap_or(Value::Null)
        })
        .collect();

    debug!(column = %name, semantic_type = %semantic_type, "Inferred column type");
    Column::new(name, semantic_type, values)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Normalise column names: spaces to underscores, strip anything outside
/// `[A-Za-z0-9_]`, lower-case
pub fn clean_column_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>> {
    let disallowed = Regex::new(r"[^A-Za-z0-9_]")?;
    Ok(names
        .iter()
        .map(|name| {
            let underscored = name.as_ref().replace(' ', "_");
            disallowed.replace_all(&underscored, "").to_lowercase()
        })
        .collect())
}

/// Apply `clean_column_names` to a dataset
pub fn clean_dataset_columns(dataset: Dataset) -> Result<Dataset> {
    let cleaned = clean_column_names(&dataset.column_names())?;
    dataset.rename_columns(cleaned)
}
