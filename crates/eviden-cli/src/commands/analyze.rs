//! Full analysis command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eviden_core::export::write_report;
use eviden_core::{
    analyze_with, AnalyzeOptions, InsightBundle, NarrativeSynthesizer, NarratorConfig,
};

use super::load_input;

/// KPIs shown in the terminal summary
const SUMMARY_KPIS: usize = 8;

/// Options for one `analyze` run
#[derive(Debug, Clone)]
pub struct AnalyzeRun {
    pub output: PathBuf,
    pub author: String,
    pub no_ai: bool,
    pub no_export: bool,
    pub clean_columns: bool,
    pub json: bool,
}

/// Run the full pipeline, print a summary and export the report
pub async fn cmd_analyze(file: &Path, config: &NarratorConfig, run: &AnalyzeRun) -> Result<()> {
    let dataset = load_input(file, run.clean_columns)?;
    if !run.json {
        println!(
            "✓ Dataset loaded: {} rows × {} columns",
            dataset.row_count(),
            dataset.column_count()
        );
    }

    let synthesizer = NarrativeSynthesizer::new(config);
    let options = AnalyzeOptions {
        force_fallback: run.no_ai,
    };
    let bundle = analyze_with(&dataset, &synthesizer, options)
        .await
        .context("Analysis failed")?;

    let exported = if run.no_export {
        None
    } else {
        let paths = write_report(&bundle, &run.author, &run.output)
            .with_context(|| format!("Failed to export to {}", run.output.display()))?;
        Some(paths)
    };

    // stdout carries nothing but the bundle in JSON mode
    if run.json {
        println!("{}", bundle.to_json()?);
        return Ok(());
    }

    print_summary(&bundle);

    if let Some(paths) = exported {
        println!();
        println!("✓ Bundle saved to: {}", paths.bundle.display());
        println!("✓ Metadata saved to: {}", paths.metadata.display());
        println!("✓ Report saved to: {}", paths.report.display());
    }

    println!();
    println!("{}", "=".repeat(60));
    println!("🎉 Analysis complete!");
    println!("{}", "=".repeat(60));

    Ok(())
}

fn print_summary(bundle: &InsightBundle) {
    let narrative = bundle.narrative();

    println!("✓ Dataset type: {}", bundle.domain().title());
    println!("✓ Extracted {} KPIs", bundle.kpis().len());
    println!(
        "✓ Narrative generated using: {} ({})",
        narrative.method.as_str().to_uppercase(),
        narrative.backend
    );
    if !narrative.backend_available {
        println!("  ⚠️  No generative backend configured; used the template narrative");
    }

    println!("\n📊 KEY PERFORMANCE INDICATORS:\n");
    for kpi in bundle.kpis().iter().take(SUMMARY_KPIS) {
        println!("  • {}: {}", kpi.label, kpi.value);
    }
    if bundle.kpis().len() > SUMMARY_KPIS {
        println!("  ... and {} more", bundle.kpis().len() - SUMMARY_KPIS);
    }

    println!("\n📝 NARRATIVE:\n");
    println!("{}", narrative.text.trim_end());
}
