//! Business domain classification from column names

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Inferred business domain of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainLabel {
    Sales,
    Finance,
    Customer,
    General,
}

impl DomainLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainLabel::Sales => "sales",
            DomainLabel::Finance => "finance",
            DomainLabel::Customer => "customer",
            DomainLabel::General => "general",
        }
    }

    /// Title-cased label ("Sales"), as shown in reports
    pub fn title(&self) -> &'static str {
        match self {
            DomainLabel::Sales => "Sales",
            DomainLabel::Finance => "Finance",
            DomainLabel::Customer => "Customer",
            DomainLabel::General => "General",
        }
    }
}

impl fmt::Display for DomainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DomainLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sales" => Ok(DomainLabel::Sales),
            "finance" => Ok(DomainLabel::Finance),
            "customer" => Ok(DomainLabel::Customer),
            "general" => Ok(DomainLabel::General),
            _ => Err(format!("Unknown domain: {}", s)),
        }
    }
}

/// Minimum score a domain needs to be chosen over `General`
pub const MIN_DOMAIN_SCORE: usize = 2;

/// Specific domains in tie-break priority order, with their keyword sets
const DOMAIN_KEYWORDS: &[(DomainLabel, &[&str])] = &[
    (
        DomainLabel::Sales,
        &["sales", "revenue", "price", "quantity", "product", "order"],
    ),
    (
        DomainLabel::Finance,
        &[
            "balance",
            "debit",
            "credit",
            "transaction",
            "account",
            "profit",
            "margin",
        ],
    ),
    (
        DomainLabel::Customer,
        &["customer", "churn", "retention", "lifetime", "segment", "age"],
    ),
];

/// Per-domain scores in priority order (sales, finance, customer)
///
/// A domain's score is the number of columns whose lower-cased name contains
/// any of its keywords; each column counts at most once per domain.
pub fn scores<S: AsRef<str>>(columns: &[S]) -> Vec<(DomainLabel, usize)> {
    let lowered: Vec<String> = columns.iter().map(|c| c.as_ref().to_lowercase()).collect();

    DOMAIN_KEYWORDS
        .iter()
        .map(|(domain, keywords)| {
            let score = lowered
                .iter()
                .filter(|name| keywords.iter().any(|kw| name.contains(kw)))
                .count();
            (*domain, score)
        })
        .collect()
}

/// Classify a dataset by its column names
///
/// The highest-scoring domain wins; ties go to the earlier domain in the
/// order sales, finance, customer. Below `MIN_DOMAIN_SCORE` the dataset is
/// `General`.
pub fn classify<S: AsRef<str>>(columns: &[S]) -> DomainLabel {
    let mut best: Option<(DomainLabel, usize)> = None;
    for (domain, score) in scores(columns) {
        // Strict comparison: an equal later score never displaces an earlier domain
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((domain, score));
        }
    }

    match best {
        Some((domain, score)) if score >= MIN_DOMAIN_SCORE => domain,
        _ => DomainLabel::General,
    }
}
