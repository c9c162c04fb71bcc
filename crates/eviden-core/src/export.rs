//! Export of insight bundles
//!
//! Writes up to three files into an output directory:
//! - `insight_bundle.json`: the full bundle as pretty JSON
//! - `report_metadata.json`: run metadata for downstream renderers
//! - `insight_report.md`: a plain markdown report

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bundle::InsightBundle;
use crate::error::Result;
use crate::format::{format_count, format_percentage};
use crate::profile::completeness;

pub const BUNDLE_FILE: &str = "insight_bundle.json";
pub const METADATA_FILE: &str = "report_metadata.json";
pub const REPORT_FILE: &str = "insight_report.md";

pub const PROJECT_NAME: &str = "Eviden Insight Reporter";
pub const DEFAULT_AUTHOR: &str = "Eviden";
pub const DEFAULT_TONE: &str = "Executive Business";

/// Run metadata stored next to the bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub project: String,
    pub report_id: String,
    pub author: String,
    /// RFC 3339
    pub created_at: String,
    pub tone: String,
    pub generative_used: bool,
    pub dataset_type: String,
    pub record_count: usize,
    pub kpi_count: usize,
    pub backend: String,
}

impl ReportMetadata {
    pub fn new(bundle: &InsightBundle, author: &str) -> Self {
        Self::at(bundle, author, Utc::now())
    }

    /// Metadata stamped with an explicit creation time
    pub fn at(bundle: &InsightBundle, author: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            project: PROJECT_NAME.to_string(),
            report_id: format!("EVD-{}", created_at.format("%Y%m%d_%H%M%S")),
            author: author.to_string(),
            created_at: created_at.to_rfc3339(),
            tone: DEFAULT_TONE.to_string(),
            generative_used: bundle.generative_used(),
            dataset_type: bundle.domain().as_str().to_string(),
            record_count: bundle.facts().rows,
            kpi_count: bundle.kpis().len(),
            backend: bundle.narrative().backend.clone(),
        }
    }
}

/// Files written by `write_report`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub bundle: PathBuf,
    pub metadata: PathBuf,
    pub report: PathBuf,
}

/// Write the bundle as pretty JSON
pub fn write_bundle_json(bundle: &InsightBundle, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(BUNDLE_FILE);
    fs::write(&path, bundle.to_json()?)?;
    Ok(path)
}

pub fn write_metadata(metadata: &ReportMetadata, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(METADATA_FILE);
    fs::write(&path, serde_json::to_string_pretty(metadata)?)?;
    Ok(path)
}

/// Write bundle, metadata and markdown report into `dir`
pub fn write_report(bundle: &InsightBundle, author: &str, dir: &Path) -> Result<ExportPaths> {
    let metadata = ReportMetadata::new(bundle, author);

    let bundle_path = write_bundle_json(bundle, dir)?;
    let metadata_path = write_metadata(&metadata, dir)?;
    let report_path = dir.join(REPORT_FILE);
    fs::write(&report_path, render_markdown(bundle, &metadata))?;

    info!(dir = %dir.display(), report_id = %metadata.report_id, "Exported insight report");

    Ok(ExportPaths {
        bundle: bundle_path,
        metadata: metadata_path,
        report: report_path,
    })
}

/// Render a plain markdown report: header, overview, KPI table, narrative, appendix
pub fn render_markdown(bundle: &InsightBundle, metadata: &ReportMetadata) -> String {
    let facts = bundle.facts();
    let missing = bundle.missing();
    let narrative = bundle.narrative();
    let complete = completeness(missing.total_missing, facts.rows * facts.columns);

    let mut out = String::new();

    out.push_str(&format!("# {} Insight Report\n\n", bundle.domain().title()));
    out.push_str(&format!("- **Report ID**: {}\n", metadata.report_id));
    out.push_str(&format!("- **Author**: {}\n", metadata.author));
    out.push_str(&format!("- **Created**: {}\n", metadata.created_at));
    out.push_str(&format!("- **Tone**: {}\n\n", metadata.tone));

    out.push_str("## Dataset Overview\n\n");
    out.push_str(&format!("- Records: {}\n", format_count(facts.rows)));
    out.push_str(&format!("- Columns: {}\n", facts.columns));
    out.push_str(&format!(
        "- Numeric / Categorical / Datetime / Boolean: {} / {} / {} / {}\n\n",
        facts.numeric_columns,
        facts.categorical_columns,
        facts.datetime_columns,
        facts.boolean_columns
    ));

    out.push_str("## Key Performance Indicators\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    for kpi in bundle.kpis() {
        out.push_str(&format!(
            "| {} | {} |\n",
            escape_cell(&kpi.label),
            escape_cell(&kpi.value)
        ));
    }
    out.push('\n');

    out.push_str(narrative.text.trim_end());
    out.push_str("\n\n");

    out.push_str("## Technical Appendix\n\n");
    out.push_str(&format!(
        "- Total Missing Values: {}\n",
        format_count(missing.total_missing)
    ));
    out.push_str(&format!("- Affected Columns: {}\n", missing.columns_with_missing));
    out.push_str(&format!(
        "- Dataset Integrity: {} Complete\n",
        format_percentage(complete / 100.0, 2)
    ));
    out.push_str(&format!("- Generation Method: {}\n", narrative.method));
    out.push_str(&format!("- Backend: {}\n", narrative.backend));

    out
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::classify::DomainLabel;
    use crate::kpi::KpiList;
    use crate::narrative::{NarrativeMethod, NarrativeResult};
    use crate::profile::{ColumnStatistics, DatasetFacts, MissingValueReport};

    fn bundle() -> InsightBundle {
        let mut kpis = KpiList::new();
        kpis.insert("Total Revenue", "$600.00");
        kpis.insert("Top Product", "A | B (2 sales)");
        kpis.insert("Dataset Type", "Sales");

        InsightBundle::new(
            DomainLabel::Sales,
            DatasetFacts {
                rows: 1200,
                columns: 3,
                numeric_columns: 2,
                categorical_columns: 1,
                datetime_columns: 0,
                boolean_columns: 0,
            },
            MissingValueReport::default(),
            kpis,
            NarrativeResult {
                text: "## EXECUTIVE SUMMARY\n\nFine.\n".into(),
                method: NarrativeMethod::Fallback,
                backend: "rule-based".into(),
                backend_available: false,
            },
            ColumnStatistics::default(),
        )
    }

    #[test]
    fn test_metadata_fields() {
        let created = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let meta = ReportMetadata::at(&bundle(), "Analytics", created);

        assert_eq!(meta.report_id, "EVD-20250314_092653");
        assert_eq!(meta.created_at, "2025-03-14T09:26:53+00:00");
        assert_eq!(meta.dataset_type, "sales");
        assert_eq!(meta.record_count, 1200);
        assert_eq!(meta.kpi_count, 3);
        assert!(!meta.generative_used);
        assert_eq!(meta.backend, "rule-based");
    }

    #[test]
    fn test_render_markdown() {
        let bundle = bundle();
        let meta = ReportMetadata::new(&bundle, DEFAULT_AUTHOR);
        let md = render_markdown(&bundle, &meta);

        assert!(md.starts_with("# Sales Insight Report\n"));
        assert!(md.contains("- Records: 1,200"));
        assert!(md.contains("| Total Revenue | $600.00 |"));
        assert!(md.contains("| Top Product | A \\| B (2 sales) |"));
        assert!(md.contains("## EXECUTIVE SUMMARY"));
        assert!(md.contains("- Dataset Integrity: 100.00% Complete"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");

        let paths = write_report(&bundle(), "Analytics", &out).unwrap();
        assert!(paths.report.exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&paths.bundle).unwrap()).unwrap();
        assert_eq!(json["domain"], "sales");
        assert_eq!(json["kpis"][0]["label"], "Total Revenue");
        assert_eq!(json["narrative"]["method"], "fallback");

        let meta: ReportMetadata =
            serde_json::from_str(&fs::read_to_string(&paths.metadata).unwrap()).unwrap();
        assert_eq!(meta.author, "Analytics");
        assert!(meta.report_id.starts_with("EVD-"));
    }
}
