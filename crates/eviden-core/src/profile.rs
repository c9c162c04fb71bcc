//! Dataset profiling: shape, semantic types, missing values, column statistics

use serde::Serialize;

use crate::dataset::{Column, Dataset, SemanticType, Value};

/// Categorical statistics are only computed for this many columns
pub const MAX_CATEGORICAL_STATS: usize = 10;

/// Data-quality threshold below which the narrative flags completeness
pub const COMPLETENESS_WARNING_THRESHOLD: f64 = 95.0;

/// Dataset-level shape facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetFacts {
    pub rows: usize,
    pub columns: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub datetime_columns: usize,
    pub boolean_columns: usize,
}

/// Missing values in a single column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingColumn {
    pub column: String,
    pub count: usize,
    pub percentage: f64,
}

/// Missing-value summary; `details` sorted by percentage descending
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MissingValueReport {
    pub total_missing: usize,
    pub columns_with_missing: usize,
    pub details: Vec<MissingColumn>,
}

/// Column names grouped by semantic type, declaration order preserved
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TypedColumns {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub datetime: Vec<String>,
    pub boolean: Vec<String>,
}

impl TypedColumns {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut typed = Self::default();
        for column in dataset.columns() {
            let bucket = match column.semantic_type {
                SemanticType::Numeric => &mut typed.numeric,
                SemanticType::Categorical => &mut typed.categorical,
                SemanticType::Datetime => &mut typed.datetime,
                SemanticType::Boolean => &mut typed.boolean,
            };
            bucket.push(column.name.clone());
        }
        typed
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.iter().any(|c| c == name)
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical.iter().any(|c| c == name)
    }

    pub fn is_datetime(&self, name: &str) -> bool {
        self.datetime.iter().any(|c| c == name)
    }

    pub fn is_boolean(&self, name: &str) -> bool {
        self.boolean.iter().any(|c| c == name)
    }
}

/// Per-column descriptive statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnStats {
    Numeric {
        count: usize,
        mean: Option<f64>,
        std: Option<f64>,
        min: Option<f64>,
        #[serde(rename = "25%")]
        q25: Option<f64>,
        #[serde(rename = "50%")]
        q50: Option<f64>,
        #[serde(rename = "75%")]
        q75: Option<f64>,
        max: Option<f64>,
    },
    Categorical {
        unique: usize,
        most_frequent: Option<String>,
        frequency: usize,
    },
    Datetime {
        min: Option<String>,
        max: Option<String>,
        span_days: Option<i64>,
    },
    Boolean {
        true_count: usize,
        false_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    #[serde(flatten)]
    pub stats: ColumnStats,
}

/// Descriptive statistics in declaration order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnStatistics {
    pub columns: Vec<ColumnSummary>,
}

impl ColumnStatistics {
    pub fn get(&self, name: &str) -> Option<&ColumnStats> {
        self.columns
            .iter()
            .find(|s| s.column == name)
            .map(|s| &s.stats)
    }
}

/// Data-quality validation summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    pub total_cells: usize,
    pub missing_cells: usize,
    pub completeness: f64,
}

impl DataQuality {
    pub fn is_acceptable(&self) -> bool {
        self.completeness >= COMPLETENESS_WARNING_THRESHOLD
    }
}

/// Everything the profiler knows about a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub facts: DatasetFacts,
    pub missing: MissingValueReport,
    pub typed: TypedColumns,
    pub statistics: ColumnStatistics,
}

impl Profile {
    /// Percentage of non-missing cells (100 for a dataset with no cells)
    pub fn completeness(&self) -> f64 {
        completeness(
            self.missing.total_missing,
            self.facts.rows * self.facts.columns,
        )
    }

    pub fn quality(&self) -> DataQuality {
        DataQuality {
            total_cells: self.facts.rows * self.facts.columns,
            missing_cells: self.missing.total_missing,
            completeness: self.completeness(),
        }
    }
}

pub(crate) fn completeness(missing: usize, total_cells: usize) -> f64 {
    if total_cells == 0 {
        return 100.0;
    }
    100.0 - (missing as f64 / total_cells as f64) * 100.0
}

/// Computes dataset facts
pub struct Profiler;

impl Profiler {
    pub fn profile(dataset: &Dataset) -> Profile {
        let typed = TypedColumns::from_dataset(dataset);
        let facts = DatasetFacts {
            rows: dataset.row_count(),
            columns: dataset.column_count(),
            numeric_columns: typed.numeric.len(),
            categorical_columns: typed.categorical.len(),
            datetime_columns: typed.datetime.len(),
            boolean_columns: typed.boolean.len(),
        };

        let missing = Self::missing_values(dataset);
        let statistics = Self::statistics(dataset);

        tracing::debug!(
            rows = facts.rows,
            columns = facts.columns,
            missing = missing.total_missing,
            "Profiled dataset"
        );

        Profile {
            facts,
            missing,
            typed,
            statistics,
        }
    }

    pub fn missing_values(dataset: &Dataset) -> MissingValueReport {
        let rows = dataset.row_count();
        let mut details: Vec<MissingColumn> = dataset
            .columns()
            .iter()
            .filter_map(|column| {
                let count = column.missing_count();
                if count == 0 {
                    return None;
                }
                Some(MissingColumn {
                    column: column.name.clone(),
                    count,
                    percentage: count as f64 / rows as f64 * 100.0,
                })
            })
            .collect();

        // Stable: equal percentages keep declaration order
        details.sort_by(|a, b| {
            b.percentage
                .partial_cmp(&a.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        MissingValueReport {
            total_missing: dataset.missing_cells(),
            columns_with_missing: details.len(),
            details,
        }
    }

    pub fn statistics(dataset: &Dataset) -> ColumnStatistics {
        let mut categorical_seen = 0;
        let mut columns = Vec::new();

        for column in dataset.columns() {
            let stats = match column.semantic_type {
                SemanticType::Numeric => numeric_stats(column),
                SemanticType::Categorical => {
                    categorical_seen += 1;
                    if categorical_seen > MAX_CATEGORICAL_STATS {
                        continue;
                    }
                    categorical_stats(column)
                }
                SemanticType::Datetime => datetime_stats(column),
                SemanticType::Boolean => boolean_stats(column),
            };
            columns.push(ColumnSummary {
                column: column.name.clone(),
                stats,
            });
        }

        ColumnStatistics { columns }
    }
}

fn numeric_stats(column: &Column) -> ColumnStats {
    ColumnStats::Numeric {
        count: column.numbers().len(),
        mean: column.mean(),
        std: column.std_dev(),
        min: column.min(),
        q25: column.quantile(0.25),
        q50: column.quantile(0.5),
        q75: column.quantile(0.75),
        max: column.max(),
    }
}

fn categorical_stats(column: &Column) -> ColumnStats {
    let mode = column.mode();
    ColumnStats::Categorical {
        unique: column.distinct_count(),
        frequency: mode.as_ref().map(|(_, c)| *c).unwrap_or(0),
        most_frequent: mode.map(|(v, _)| v),
    }
}

fn datetime_stats(column: &Column) -> ColumnStats {
    match column.datetime_range() {
        Some((lo, hi)) => ColumnStats::Datetime {
            min: Some(lo.format("%Y-%m-%d %H:%M:%S").to_string()),
            max: Some(hi.format("%Y-%m-%d %H:%M:%S").to_string()),
            span_days: Some((hi - lo).num_days()),
        },
        None => ColumnStats::Datetime {
            min: None,
            max: None,
            span_days: None,
        },
    }
}

fn boolean_stats(column: &Column) -> ColumnStats {
    let mut true_count = 0;
    let mut false_count = 0;
    for value in &column.values {
        match value {
            Value::Bool(true) => true_count += 1,
            Value::Bool(false) => false_count += 1,
            _ => {}
        }
    }
    ColumnStats::Boolean {
        true_count,
        false_count,
    }
}
