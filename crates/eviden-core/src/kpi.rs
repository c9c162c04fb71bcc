//! Domain-specific KPI extraction
//!
//! Each domain has an ordered list of rules. A rule resolves its column by
//! keyword priority and is skipped when the column is absent, has the wrong
//! semantic type, or holds no usable values.

use serde::Serialize;

use crate::classify::DomainLabel;
use crate::dataset::{Column, Dataset, Value};
use crate::format::{format_count, format_currency, format_number, format_percentage};
use crate::profile::{completeness, TypedColumns};
use crate::resolve::{self, resolve};

/// Label of the KPI appended to every list
pub const DATASET_TYPE_LABEL: &str = "Dataset Type";

/// Churn flag values for non-numeric, non-boolean churn columns
const CHURN_TRUTHY: &[&str] = &["yes", "true", "1", "churned"];

/// A single computed metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiEntry {
    pub label: String,
    pub value: String,
}

/// Ordered KPI list
///
/// Insertion order is preserved. Inserting an existing label replaces its
/// value in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct KpiList {
    entries: Vec<KpiEntry>,
}

impl KpiList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(existing) => existing.value = value,
            None => self.entries.push(KpiEntry { label, value }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KpiEntry> {
        self.entries.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn last(&self) -> Option<&KpiEntry> {
        self.entries.last()
    }
}

impl<'a> IntoIterator for &'a KpiList {
    type Item = &'a KpiEntry;
    type IntoIter = std::slice::Iter<'a, KpiEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Computes domain KPIs from a typed dataset
pub struct KpiExtractor;

impl KpiExtractor {
    pub fn extract(dataset: &Dataset, typed: &TypedColumns, domain: DomainLabel) -> KpiList {
        let ctx = RuleContext {
            dataset,
            typed,
            names: dataset.column_names(),
        };

        let mut kpis = match domain {
            DomainLabel::Sales => ctx.sales(),
            DomainLabel::Finance => ctx.finance(),
            DomainLabel::Customer => ctx.customer(),
            DomainLabel::General => ctx.general(),
        };

        kpis.insert(DATASET_TYPE_LABEL, domain.title());

        tracing::debug!(domain = %domain, count = kpis.len(), "Extracted KPIs");
        kpis
    }
}

struct RuleContext<'a> {
    dataset: &'a Dataset,
    typed: &'a TypedColumns,
    names: Vec<&'a str>,
}

impl<'a> RuleContext<'a> {
    /// Resolved column with at least one present cell, any type
    fn any(&self, role: &str, keywords: &[&str]) -> Option<&'a Column> {
        let name = resolve(&self.names, keywords);
        let column = name
            .and_then(|n| self.dataset.column(n))
            .filter(|c| c.present().next().is_some());
        if column.is_none() {
            tracing::debug!(role, column = ?name, "Skipping KPI rule: no usable column");
        }
        column
    }

    /// Resolved numeric column with at least one number
    fn numeric(&self, role: &str, keywords: &[&str]) -> Option<&'a Column> {
        let name = resolve(&self.names, keywords);
        let column = name
            .filter(|n| self.typed.is_numeric(n))
            .and_then(|n| self.dataset.column(n))
            .filter(|c| !c.numbers().is_empty());
        if column.is_none() {
            tracing::debug!(role, column = ?name, "Skipping KPI rule: no numeric column");
        }
        column
    }

    fn sales(&self) -> KpiList {
        let mut kpis = KpiList::new();

        if let Some(revenue) = self.numeric("revenue", resolve::SALES_REVENUE) {
            kpis.insert("Total Revenue", format_currency(revenue.sum()));
            if let Some(mean) = revenue.mean() {
                kpis.insert("Average Order Value", format_currency(mean));
            }
            if let Some(std) = revenue.std_dev() {
                kpis.insert("Revenue Std Dev", format_currency(std));
            }
        }

        if let Some(quantity) = self.numeric("quantity", resolve::SALES_QUANTITY) {
            kpis.insert("Total Units Sold", format_number(quantity.sum(), 0));
            if let Some(mean) = quantity.mean() {
                kpis.insert("Avg Units per Transaction", format!("{:.2}", mean));
            }
        }

        if let Some(product) = self.any("product", resolve::SALES_PRODUCT) {
            kpis.insert("Unique Products", format_count(product.distinct_count()));
            if let Some((name, count)) = product.mode() {
                kpis.insert("Top Product", format!("{} ({} sales)", name, count));
            }
        }

        if let Some(margin) = self.numeric("margin", resolve::SALES_MARGIN) {
            if let Some(mean) = margin.mean() {
                kpis.insert("Average Margin", format_percentage(mean, 2));
            }
            if let (Some(min), Some(max)) = (margin.min(), margin.max()) {
                kpis.insert(
                    "Margin Range",
                    format!("{} - {}", format_percentage(min, 2), format_percentage(max, 2)),
                );
            }
        }

        let date = resolve(&self.names, resolve::DATE)
            .filter(|n| self.typed.is_datetime(n))
            .and_then(|n| self.dataset.column(n))
            .and_then(Column::datetime_range);
        match date {
            Some((lo, hi)) => {
                let days = (hi - lo).num_days();
                kpis.insert("Data Period", format!("{} days", days));
                if days > 0 {
                    let per_day = self.dataset.row_count() as f64 / days as f64;
                    kpis.insert("Avg Transactions per Day", format!("{:.2}", per_day));
                }
            }
            None => tracing::debug!(role = "date", "Skipping KPI rule: no datetime column"),
        }

        kpis
    }

    fn finance(&self) -> KpiList {
        let mut kpis = KpiList::new();

        if let Some(balance) = self.numeric("balance", resolve::FINANCE_BALANCE) {
            kpis.insert("Total Balance", format_currency(balance.sum()));
            if let Some(mean) = balance.mean() {
                kpis.insert("Average Balance", format_currency(mean));
            }
            if let Some(median) = balance.median() {
                kpis.insert("Median Balance", format_currency(median));
            }
        }

        let debit = self.numeric("debit", resolve::FINANCE_DEBIT);
        if let Some(debit) = debit {
            kpis.insert("Total Debits", format_currency(debit.sum()));
            if let Some(mean) = debit.mean() {
                kpis.insert("Average Debit", format_currency(mean));
            }
        }

        let credit = self.numeric("credit", resolve::FINANCE_CREDIT);
        if let Some(credit) = credit {
            kpis.insert("Total Credits", format_currency(credit.sum()));
            if let Some(mean) = credit.mean() {
                kpis.insert("Average Credit", format_currency(mean));
            }
        }

        if let (Some(debit), Some(credit)) = (debit, credit) {
            kpis.insert("Net Position", format_currency(credit.sum() - debit.sum()));
        }

        if let Some(account) = self.any("account", resolve::FINANCE_ACCOUNT) {
            kpis.insert("Total Accounts", format_count(account.distinct_count()));
        }

        if let Some(transaction) = self.any("transaction type", resolve::FINANCE_TRANSACTION) {
            kpis.insert("Transaction Types", format_count(transaction.distinct_count()));
            if let Some((name, _)) = transaction.mode() {
                kpis.insert("Most Common Transaction", name);
            }
        }

        kpis
    }

    fn customer(&self) -> KpiList {
        let mut kpis = KpiList::new();
        let rows = self.dataset.row_count();

        if let Some(id) = self.any("customer id", resolve::CUSTOMER_ID) {
            kpis.insert("Total Customers", format_count(id.distinct_count()));
        }

        if let Some(churn) = self.any("churn", resolve::CUSTOMER_CHURN) {
            if rows > 0 {
                let churn_rate = churned_count(churn, self.typed) / rows as f64;
                // Rate can exceed 1 for numeric flags
                kpis.insert("Churn Rate", format!("{:.2}%", churn_rate * 100.0));
                kpis.insert("Retention Rate", format!("{:.2}%", (1.0 - churn_rate) * 100.0));
            }
        }

        if let Some(age) = self.numeric("age/tenure", resolve::CUSTOMER_AGE) {
            if let Some(mean) = age.mean() {
                kpis.insert("Average Age/Tenure", format!("{:.1}", mean));
            }
            if let (Some(min), Some(max)) = (age.min(), age.max()) {
                kpis.insert("Age/Tenure Range", format!("{:.0} - {:.0}", min, max));
            }
        }

        if let Some(segment) = self.any("segment", resolve::CUSTOMER_SEGMENT) {
            kpis.insert("Customer Segments", format_count(segment.distinct_count()));
            if let Some((name, count)) = segment.mode() {
                let share = count as f64 / rows as f64;
                kpis.insert(
                    "Largest Segment",
                    format!("{} ({})", name, format_percentage(share, 1)),
                );
            }
        }

        if let Some(value) = self.numeric("customer value", resolve::CUSTOMER_VALUE) {
            if let Some(mean) = value.mean() {
                kpis.insert("Avg Customer Value", format_currency(mean));
            }
            kpis.insert("Total Customer Value", format_currency(value.sum()));
            if let Some(median) = value.median() {
                kpis.insert("Median Customer Value", format_currency(median));
            }
        }

        kpis
    }

    fn general(&self) -> KpiList {
        let mut kpis = KpiList::new();
        let rows = self.dataset.row_count();

        kpis.insert("Total Records", format_count(rows));
        kpis.insert("Total Columns", format_count(self.dataset.column_count()));

        let complete = completeness(self.dataset.missing_cells(), self.dataset.total_cells());
        kpis.insert("Data Completeness", format_percentage(complete / 100.0, 2));

        // Strict comparisons: the first column wins ties
        let mut highest: Option<(&str, f64)> = None;
        for name in &self.typed.numeric {
            let mean = self.dataset.column(name).and_then(Column::mean);
            if let Some(mean) = mean {
                if highest.map_or(true, |(_, best)| mean > best) {
                    highest = Some((name.as_str(), mean));
                }
            }
        }
        if let Some((name, mean)) = highest {
            kpis.insert(format!("Highest Avg ({})", name), format_number(mean, 2));
        }

        if rows > 0 {
            let mut diverse: Option<(&str, usize)> = None;
            for name in &self.typed.categorical {
                if let Some(column) = self.dataset.column(name) {
                    let unique = column.distinct_count();
                    if diverse.map_or(true, |(_, best)| unique > best) {
                        diverse = Some((name.as_str(), unique));
                    }
                }
            }
            if let Some((name, unique)) = diverse {
                kpis.insert(
                    "Most Diverse Column",
                    format!("{} ({} unique)", name, unique),
                );
            }
        }

        kpis
    }
}

/// Number of rows flagged as churned
fn churned_count(column: &Column, typed: &TypedColumns) -> f64 {
    if typed.is_numeric(&column.name) {
        return column.sum();
    }
    if typed.is_boolean(&column.name) {
        return column
            .values
            .iter()
            .filter(|v| matches!(v, Value::Bool(true)))
            .count() as f64;
    }
    column
        .present()
        .filter(|v| {
            let flag = v.to_string().trim().to_lowercase();
            CHURN_TRUTHY.contains(&flag.as_str())
        })
        .count() as f64
}
