//! Profile → classify → extract → narrate

use tracing::info;

use crate::bundle::InsightBundle;
use crate::classify::classify;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::kpi::KpiExtractor;
use crate::narrative::{NarrativeInput, NarrativeSynthesizer};
use crate::profile::Profiler;

/// Per-run switches
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Skip the generative backend even when one is configured
    pub force_fallback: bool,
}

/// Run the full pipeline with default options
pub async fn analyze(
    dataset: &Dataset,
    synthesizer: &NarrativeSynthesizer,
) -> Result<InsightBundle> {
    analyze_with(dataset, synthesizer, AnalyzeOptions::default()).await
}

/// Run the full pipeline
///
/// Only an empty dataset aborts; every later stage degrades instead of failing.
pub async fn analyze_with(
    dataset: &Dataset,
    synthesizer: &NarrativeSynthesizer,
    options: AnalyzeOptions,
) -> Result<InsightBundle> {
    if dataset.is_empty() {
        return Err(Error::EmptyDataset(format!(
            "{} rows x {} columns",
            dataset.row_count(),
            dataset.column_count()
        )));
    }

    let profile = Profiler::profile(dataset);
    info!(
        rows = profile.facts.rows,
        columns = profile.facts.columns,
        missing = profile.missing.total_missing,
        "Profiled dataset"
    );

    let domain = classify(&dataset.column_names());
    info!(domain = %domain, "Classified dataset");

    let kpis = KpiExtractor::extract(dataset, &profile.typed, domain);
    info!(count = kpis.len(), "Extracted KPIs");

    let input = NarrativeInput {
        domain,
        facts: &profile.facts,
        missing: &profile.missing,
        kpis: &kpis,
    };
    let narrative = if options.force_fallback {
        synthesizer.synthesize_fallback(input)
    } else {
        synthesizer.synthesize(input).await
    };
    info!(method = %narrative.method, backend = %narrative.backend, "Generated narrative");

    Ok(InsightBundle::new(
        domain,
        profile.facts,
        profile.missing,
        kpis,
        narrative,
        profile.statistics,
    ))
}
