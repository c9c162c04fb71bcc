//! Inspection commands: profile, classify, kpis

use std::path::Path;

use anyhow::Result;
use eviden_core::classify::{classify, scores, MIN_DOMAIN_SCORE};
use eviden_core::profile::ColumnStats;
use eviden_core::{DomainLabel, KpiExtractor, Profiler};

use super::load_input;

/// Print dataset facts, missing values and column statistics
pub fn cmd_profile(file: &Path, clean_columns: bool, json: bool) -> Result<()> {
    let dataset = load_input(file, clean_columns)?;
    let profile = Profiler::profile(&dataset);

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let facts = &profile.facts;
    let quality = profile.quality();

    println!("📋 Dataset Profile\n");
    println!("  Rows:        {}", facts.rows);
    println!("  Columns:     {}", facts.columns);
    println!(
        "  Types:       {} numeric, {} categorical, {} datetime, {} boolean",
        facts.numeric_columns,
        facts.categorical_columns,
        facts.datetime_columns,
        facts.boolean_columns
    );
    println!(
        "  Completeness: {:.2}% ({} of {} cells missing){}",
        quality.completeness,
        quality.missing_cells,
        quality.total_cells,
        if quality.is_acceptable() { "" } else { " ⚠️" }
    );

    if !profile.missing.details.is_empty() {
        println!("\n🕳️  Missing values:\n");
        for m in &profile.missing.details {
            println!("  {:<24} {:>6} ({:.1}%)", m.column, m.count, m.percentage);
        }
    }

    println!("\n📊 Columns:\n");
    for summary in &profile.statistics.columns {
        println!("  {:<24} {}", summary.column, describe(&summary.stats));
    }

    Ok(())
}

/// Print the inferred domain with per-domain scores
pub fn cmd_classify(file: &Path, clean_columns: bool) -> Result<()> {
    let dataset = load_input(file, clean_columns)?;
    let names = dataset.column_names();
    let domain = classify(&names);

    println!("🏷️  Domain: {}\n", domain.title());
    for (candidate, score) in scores(&names) {
        let marker = if candidate == domain { "→" } else { " " };
        println!("  {} {:<10} {}", marker, candidate.title(), score);
    }
    if domain == DomainLabel::General {
        println!("\n  No domain reached the minimum score of {}", MIN_DOMAIN_SCORE);
    }

    Ok(())
}

/// Print KPIs for the inferred (or given) domain
pub fn cmd_kpis(file: &Path, domain: Option<&str>, clean_columns: bool, json: bool) -> Result<()> {
    let dataset = load_input(file, clean_columns)?;
    let domain = match domain {
        Some(d) => d.parse::<DomainLabel>().map_err(|e| anyhow::anyhow!(e))?,
        None => classify(&dataset.column_names()),
    };

    let profile = Profiler::profile(&dataset);
    let kpis = KpiExtractor::extract(&dataset, &profile.typed, domain);

    if json {
        println!("{}", serde_json::to_string_pretty(&kpis)?);
        return Ok(());
    }

    println!("📊 {} KPIs ({}):\n", domain.title(), kpis.len());
    for kpi in &kpis {
        println!("  • {}: {}", kpi.label, kpi.value);
    }

    Ok(())
}

fn describe(stats: &ColumnStats) -> String {
    match stats {
        ColumnStats::Numeric {
            count,
            mean,
            min,
            max,
            ..
        } => format!(
            "numeric      n={} mean={} min={} max={}",
            count,
            opt(mean),
            opt(min),
            opt(max)
        ),
        ColumnStats::Categorical {
            unique,
            most_frequent,
            frequency,
        } => format!(
            "categorical  {} unique, top={} ({})",
            unique,
            most_frequent.as_deref().unwrap_or("-"),
            frequency
        ),
        ColumnStats::Datetime { min, max, span_days } => format!(
            "datetime     {} to {} ({} days)",
            min.as_deref().unwrap_or("-"),
            max.as_deref().unwrap_or("-"),
            span_days.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
        ),
        ColumnStats::Boolean {
            true_count,
            false_count,
        } => format!("boolean      {} true, {} false", true_count, false_count),
    }
}

fn opt(value: &Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}
