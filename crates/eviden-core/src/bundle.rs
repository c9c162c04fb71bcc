//! The assembled result of one analysis run

use serde::Serialize;

use crate::classify::DomainLabel;
use crate::kpi::KpiList;
use crate::narrative::NarrativeResult;
use crate::profile::{ColumnStatistics, DatasetFacts, MissingValueReport};

/// Domain, facts, metrics and narrative for one dataset
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightBundle {
    domain: DomainLabel,
    facts: DatasetFacts,
    missing: MissingValueReport,
    kpis: KpiList,
    narrative: NarrativeResult,
    statistics: ColumnStatistics,
}

impl InsightBundle {
    pub fn new(
        domain: DomainLabel,
        facts: DatasetFacts,
        missing: MissingValueReport,
        kpis: KpiList,
        narrative: NarrativeResult,
        statistics: ColumnStatistics,
    ) -> Self {
        Self {
            domain,
            facts,
            missing,
            kpis,
            narrative,
            statistics,
        }
    }

    pub fn domain(&self) -> DomainLabel {
        self.domain
    }

    pub fn facts(&self) -> &DatasetFacts {
        &self.facts
    }

    pub fn missing(&self) -> &MissingValueReport {
        &self.missing
    }

    pub fn kpis(&self) -> &KpiList {
        &self.kpis
    }

    pub fn narrative(&self) -> &NarrativeResult {
        &self.narrative
    }

    pub fn statistics(&self) -> &ColumnStatistics {
        &self.statistics
    }

    /// Whether the narrative came from the generative backend
    pub fn generative_used(&self) -> bool {
        self.narrative.method == crate::narrative::NarrativeMethod::Generative
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
