//! Tabular dataset model
//!
//! A `Dataset` is an ordered list of named, typed columns. The semantic type of
//! each column is attached by the loader at ingestion time; nothing downstream
//! re-inspects cell values to decide what kind of column it is.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Semantic type declared for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Numeric,
    Categorical,
    Datetime,
    Boolean,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Categorical => "categorical",
            SemanticType::Datetime => "datetime",
            SemanticType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "numeric" => Ok(SemanticType::Numeric),
            "categorical" => Ok(SemanticType::Categorical),
            "datetime" => Ok(SemanticType::Datetime),
            "boolean" => Ok(SemanticType::Boolean),
            _ => Err(format!("Unknown semantic type: {}", s)),
        }
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Text(String),
}

impl Value {
    /// Whether this cell counts as missing (null, NaN, or blank text)
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(n) => n.is_nan(),
            Value::Text(s) => s.trim().is_empty(),
            Value::Bool(_) | Value::DateTime(_) => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            // Whole numbers print without a trailing ".0" (ids, codes, counts)
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A named, typed column of cell values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub semantic_type: SemanticType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            values,
        }
    }

    /// Numeric column from plain floats
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            name,
            SemanticType::Numeric,
            values.into_iter().map(Value::Number).collect(),
        )
    }

    /// Categorical column from strings
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            name,
            SemanticType::Categorical,
            values.into_iter().map(|v| Value::Text(v.into())).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Non-missing cells in row order
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    /// Non-missing numeric cells in row order
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    pub fn sum(&self) -> f64 {
        self.numbers().iter().sum()
    }

    pub fn mean(&self) -> Option<f64> {
        let nums = self.numbers();
        if nums.is_empty() {
            return None;
        }
        Some(nums.iter().sum::<f64>() / nums.len() as f64)
    }

    /// Sample standard deviation (n - 1 denominator)
    pub fn std_dev(&self) -> Option<f64> {
        let nums = self.numbers();
        if nums.len() < 2 {
            return None;
        }
        let mean = nums.iter().sum::<f64>() / nums.len() as f64;
        let var = nums.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / (nums.len() - 1) as f64;
        Some(var.sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        self.numbers().into_iter().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.numbers().into_iter().reduce(f64::max)
    }

    pub fn median(&self) -> Option<f64> {
        self.quantile(0.5)
    }

    /// Linear-interpolated quantile, `q` in [0, 1]
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let mut nums = self.numbers();
        if nums.is_empty() {
            return None;
        }
        nums.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let pos = q.clamp(0.0, 1.0) * (nums.len() - 1) as f64;
        let lower = pos.floor() as usize;
        let upper = pos.ceil() as usize;
        let frac = pos - lower as f64;
        Some(nums[lower] + (nums[upper] - nums[lower]) * frac)
    }

    /// Earliest and latest datetime cells
    pub fn datetime_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut dates = self.values.iter().filter_map(Value::as_datetime);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Number of distinct non-missing values
    pub fn distinct_count(&self) -> usize {
        self.present()
            .map(|v| v.to_string())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Value frequencies, most frequent first; ties keep first-seen order
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in self.present() {
            let key = value.to_string();
            let count = counts.entry(key.clone()).or_insert(0);
            if *count == 0 {
                order.push(key);
            }
            *count += 1;
        }

        let mut result: Vec<(String, usize)> = order
            .into_iter()
            .map(|k| {
                let c = counts[&k];
                (k, c)
            })
            .collect();
        // Stable sort keeps first-seen order among equal counts
        result.sort_by(|a, b| b.1.cmp(&a.1));
        result
    }

    /// Most frequent non-missing value and its frequency
    pub fn mode(&self) -> Option<(String, usize)> {
        self.value_counts().into_iter().next()
    }
}

/// An ordered collection of uniquely named, equal-length columns
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate names and ragged columns
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::InvalidData(format!(
                    "Duplicate column name: {}",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(Error::InvalidData(format!(
                    "Column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    rows
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.column_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Total missing cells across all columns
    pub fn missing_cells(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    pub fn total_cells(&self) -> usize {
        self.row_count() * self.column_count()
    }

    /// Rename columns in place (used by column-name cleaning)
    pub fn rename_columns(self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.columns.len() {
            return Err(Error::InvalidData(format!(
                "Expected {} column names, got {}",
                self.columns.len(),
                names.len()
            )));
        }
        let columns = self
            .columns
            .into_iter()
            .zip(names)
            .map(|(mut c, name)| {
                c.name = name;
                c
            })
            .collect();
        Self::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_rejects_duplicate_names() {
        let result = Dataset::new(vec![
            Column::numeric("a", [1.0]),
            Column::numeric("a", [2.0]),
        ]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_dataset_rejects_ragged_columns() {
        let result = Dataset::new(vec![
            Column::numeric("a", [1.0, 2.0]),
            Column::numeric("b", [2.0]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_detection() {
        assert!(Value::Null.is_missing());
        assert!(Value::Number(f64::NAN).is_missing());
        assert!(Value::Text("  ".into()).is_missing());
        assert!(!Value::Text("x".into()).is_missing());
        assert!(!Value::Number(0.0).is_missing());
    }

    #[test]
    fn test_numeric_aggregates() {
        let col = Column::new(
            "revenue",
            SemanticType::Numeric,
            vec![
                Value::Number(100.0),
                Value::Null,
                Value::Number(200.0),
                Value::Number(300.0),
            ],
        );
        assert_eq!(col.sum(), 600.0);
        assert_eq!(col.mean(), Some(200.0));
        assert_eq!(col.median(), Some(200.0));
        assert_eq!(col.std_dev(), Some(100.0));
        assert_eq!(col.min(), Some(100.0));
        assert_eq!(col.max(), Some(300.0));
        assert_eq!(col.quantile(0.25), Some(150.0));
    }

    #[test]
    fn test_value_counts_ties_keep_first_seen() {
        let col = Column::categorical("product", ["b", "a", "a", "b", "c"]);
        let counts = col.value_counts();
        assert_eq!(counts[0], ("b".to_string(), 2));
        assert_eq!(counts[1], ("a".to_string(), 2));
        assert_eq!(counts[2], ("c".to_string(), 1));
        assert_eq!(col.distinct_count(), 3);
    }

    #[test]
    fn test_whole_numbers_display_without_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }
}
