//! Narrative synthesis
//!
//! Two linear paths that always terminate:
//! 1. A configured generative backend is called exactly once
//! 2. Otherwise, or when that call fails or returns nothing, a deterministic
//!    markdown template is rendered
//!
//! Both paths produce the same `NarrativeResult` shape.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::{AIClient, CompletionRequest, NarrativeBackend};
use crate::classify::DomainLabel;
use crate::config::NarratorConfig;
use crate::error::{Error, Result};
use crate::format::format_count;
use crate::kpi::KpiList;
use crate::profile::{
    completeness, DatasetFacts, MissingValueReport, COMPLETENESS_WARNING_THRESHOLD,
};
use crate::prompts::{PromptId, PromptLibrary};

/// Backend identifier reported by the template path
pub const FALLBACK_BACKEND: &str = "rule-based";

/// Only this many leading KPIs get a bullet in the fallback findings
const FALLBACK_KPI_BULLETS: usize = 6;

/// Missing-value columns listed in the generative prompt
const PROMPT_MISSING_COLUMNS: usize = 5;

/// Whether a generative backend can be used, decided once at construction
#[derive(Clone)]
pub enum BackendCapability {
    Configured { client: AIClient },
    Unconfigured { reason: String },
}

impl BackendCapability {
    /// Build the capability from config; incomplete config is not an error
    pub fn from_config(config: &NarratorConfig) -> Self {
        match AIClient::from_config(config) {
            Ok(client) => BackendCapability::Configured { client },
            Err(e) => BackendCapability::Unconfigured {
                reason: e.to_string(),
            },
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, BackendCapability::Configured { .. })
    }
}

impl fmt::Debug for BackendCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendCapability::Configured { client } => f
                .debug_struct("Configured")
                .field("backend", &client.kind())
                .field("model", &client.model())
                .finish(),
            BackendCapability::Unconfigured { reason } => f
                .debug_struct("Unconfigured")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// How the narrative text was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeMethod {
    Generative,
    Fallback,
}

impl NarrativeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generative => "generative",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for NarrativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Narrative text plus generation metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeResult {
    /// Markdown with four `## ` sections
    pub text: String,
    pub method: NarrativeMethod,
    /// Model id for generative output, `rule-based` otherwise
    pub backend: String,
    /// A generative backend was configured at construction
    pub backend_available: bool,
}

/// Everything the narrative is written from
#[derive(Debug, Clone, Copy)]
pub struct NarrativeInput<'a> {
    pub domain: DomainLabel,
    pub facts: &'a DatasetFacts,
    pub missing: &'a MissingValueReport,
    pub kpis: &'a KpiList,
}

/// Produces narratives, preferring the generative backend when configured
pub struct NarrativeSynthesizer {
    capability: BackendCapability,
    temperature: f32,
    max_tokens: u32,
    prompts: RwLock<PromptLibrary>,
}

impl NarrativeSynthesizer {
    pub fn new(config: &NarratorConfig) -> Self {
        let capability = BackendCapability::from_config(config);
        match &capability {
            BackendCapability::Configured { client } => info!(
                backend = %client.kind(),
                model = client.model(),
                host = client.host(),
                "Generative narrative enabled"
            ),
            BackendCapability::Unconfigured { reason } => {
                info!(reason = %reason, "Generative narrative unavailable, using template")
            }
        }

        Self {
            capability,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            prompts: RwLock::new(PromptLibrary::new()),
        }
    }

    /// Synthesizer with an explicit capability and default sampling
    pub fn with_capability(capability: BackendCapability) -> Self {
        let defaults = NarratorConfig::default();
        Self {
            capability,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            prompts: RwLock::new(PromptLibrary::new()),
        }
    }

    /// Replace the prompt library (e.g. embedded-only in tests)
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = RwLock::new(prompts);
        self
    }

    pub fn capability(&self) -> &BackendCapability {
        &self.capability
    }

    pub fn backend_available(&self) -> bool {
        self.capability.is_configured()
    }

    /// Generate a narrative, falling back to the template on any failure
    pub async fn synthesize(&self, input: NarrativeInput<'_>) -> NarrativeResult {
        if let BackendCapability::Configured { client } = &self.capability {
            match self.generate(client, input).await {
                Ok(text) if !text.trim().is_empty() => {
                    return NarrativeResult {
                        text: text.trim().to_string(),
                        method: NarrativeMethod::Generative,
                        backend: client.model().to_string(),
                        backend_available: true,
                    };
                }
                Ok(_) => warn!(
                    model = client.model(),
                    "Generative backend returned an empty narrative, using template"
                ),
                Err(e) => warn!(
                    model = client.model(),
                    error = %e,
                    "Generative narrative failed, using template"
                ),
            }
        }

        self.synthesize_fallback(input)
    }

    /// Always use the deterministic template
    pub fn synthesize_fallback(&self, input: NarrativeInput<'_>) -> NarrativeResult {
        NarrativeResult {
            text: fallback_narrative(input),
            method: NarrativeMethod::Fallback,
            backend: FALLBACK_BACKEND.to_string(),
            backend_available: self.backend_available(),
        }
    }

    async fn generate(&self, client: &AIClient, input: NarrativeInput<'_>) -> Result<String> {
        let request = self.build_request(input)?;
        debug!(chars = request.prompt.len(), "Requesting generative narrative");
        client.complete(&request).await
    }

    fn build_request(&self, input: NarrativeInput<'_>) -> Result<CompletionRequest> {
        let vars = prompt_vars(input);
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let template = prompts.get(PromptId::InsightNarrative)?;

        let mut request = CompletionRequest::new(template.render_user(&vars))
            .with_sampling(self.temperature, self.max_tokens);
        if let Some(system) = template.render_system(&vars) {
            request = request.with_system(system);
        }
        Ok(request)
    }
}

fn prompt_vars(input: NarrativeInput<'_>) -> HashMap<&'static str, String> {
    let facts = input.facts;
    let missing = input.missing;

    let kpis = input
        .kpis
        .iter()
        .map(|k| format!("- {}: {}", k.label, k.value))
        .collect::<Vec<_>>()
        .join("\n");

    let missing_details = missing
        .details
        .iter()
        .take(PROMPT_MISSING_COLUMNS)
        .map(|m| format!("  - {}: {} ({:.1}%)", m.column, m.count, m.percentage))
        .collect::<Vec<_>>()
        .join("\n");

    HashMap::from([
        ("dataset_type", input.domain.title().to_string()),
        ("rows", format_count(facts.rows)),
        ("columns", facts.columns.to_string()),
        ("numeric_columns", facts.numeric_columns.to_string()),
        ("categorical_columns", facts.categorical_columns.to_string()),
        ("total_missing", missing.total_missing.to_string()),
        ("columns_with_missing", missing.columns_with_missing.to_string()),
        ("missing_details", missing_details),
        ("kpis", kpis),
    ])
}

/// Render the deterministic four-section narrative
pub fn fallback_narrative(input: NarrativeInput<'_>) -> String {
    let facts = input.facts;
    let missing = input.missing;
    let rows = format_count(facts.rows);

    let mut text = String::new();

    text.push_str("## EXECUTIVE SUMMARY\n\n");
    text.push_str(&format!(
        "This {} dataset comprises {} records across {} features, providing a comprehensive \
         view of operational metrics. The analysis reveals key performance indicators with \
         strategic implications for business optimization. Data quality assessment indicates \
         {} missing values across {} columns, requiring attention in downstream analytics.\n\n",
        input.domain.as_str(),
        rows,
        facts.columns,
        missing.total_missing,
        missing.columns_with_missing
    ));
    text.push_str(&format!(
        "Our automated analysis identifies critical patterns in {} numeric and {} categorical \
         dimensions, enabling data-driven decision-making.\n\n",
        facts.numeric_columns, facts.categorical_columns
    ));

    text.push_str("## KEY FINDINGS\n\n");
    for kpi in input.kpis.iter().take(FALLBACK_KPI_BULLETS) {
        let label = kpi.label.to_lowercase();
        if label.contains("total") || label.contains("average") {
            text.push_str(&format!(
                "• **{}**: {} represents a critical operational metric for performance \
                 tracking\n",
                kpi.label, kpi.value
            ));
        } else {
            text.push_str(&format!("• **{}**: {}\n", kpi.label, kpi.value));
        }
    }
    text.push_str(
        "\n• Statistical analysis reveals distribution patterns requiring strategic attention\n\
         • Correlation analysis identifies key interdependencies between business metrics\n\
         • Data completeness metrics enable confidence in analytical conclusions\n\n",
    );

    text.push_str("## ACTIONABLE RECOMMENDATIONS\n\n");
    for (title, detail) in recommendations(input.domain) {
        text.push_str(&format!("• **{}**: {}\n", title, detail));
    }

    text.push_str("\n## RISKS & LIMITATIONS\n\n");
    let complete = completeness(missing.total_missing, facts.rows * facts.columns);
    if complete < COMPLETENESS_WARNING_THRESHOLD {
        text.push_str(&format!(
            "• **Data Quality**: {} missing values may impact analytical reliability\n",
            missing.total_missing
        ));
    }
    text.push_str(&format!(
        "• **Sample Size Considerations**: Analysis based on {} records; trends may vary \
         with additional data\n",
        rows
    ));
    text.push_str(
        "• **Temporal Limitations**: Results reflect current dataset timeframe; market \
         conditions may evolve\n\
         • **Correlation vs Causation**: Observed patterns require validation before \
         implementing strategic changes\n\
         • **External Factors**: Analysis does not account for exogenous variables affecting \
         business performance\n",
    );

    text
}

/// Six recommendation bullets per domain
fn recommendations(domain: DomainLabel) -> [(&'static str, &'static str); 6] {
    match domain {
        DomainLabel::Sales => [
            (
                "Optimize Revenue Streams",
                "Focus on high-performing products and channels identified in the analysis",
            ),
            (
                "Enhance Customer Targeting",
                "Leverage segmentation insights to improve conversion rates",
            ),
            (
                "Inventory Management",
                "Align stock levels with demand patterns observed in quantity metrics",
            ),
            (
                "Pricing Strategy",
                "Review pricing elasticity based on revenue and margin correlations",
            ),
            ("Sales Forecasting", "Implement predictive models using historical trend patterns"),
            ("Performance Monitoring", "Establish dashboards for real-time KPI tracking"),
        ],
        DomainLabel::Finance => [
            (
                "Cash Flow Optimization",
                "Monitor debit/credit patterns to improve liquidity management",
            ),
            (
                "Risk Assessment",
                "Analyze transaction patterns for anomaly detection and fraud prevention",
            ),
            (
                "Account Segmentation",
                "Develop targeted strategies for high-value account retention",
            ),
            ("Cost Control", "Identify expense categories with optimization potential"),
            ("Financial Planning", "Use historical patterns for improved budget forecasting"),
            ("Compliance Monitoring", "Ensure transaction data quality for regulatory reporting"),
        ],
        DomainLabel::Customer => [
            (
                "Churn Prevention",
                "Implement retention programs targeting at-risk customer segments",
            ),
            (
                "Customer Lifetime Value Optimization",
                "Focus resources on high-value customer acquisition",
            ),
            (
                "Segmentation Strategy",
                "Develop tailored engagement approaches for each customer tier",
            ),
            (
                "Experience Enhancement",
                "Address pain points identified in customer behavior patterns",
            ),
            ("Loyalty Programs", "Design initiatives based on observed retention factors"),
            ("Predictive Analytics", "Build churn prediction models for proactive intervention"),
        ],
        DomainLabel::General => [
            (
                "Data Quality Improvement",
                "Address missing values and inconsistencies identified in the analysis",
            ),
            ("Feature Engineering", "Develop new metrics based on correlation insights"),
            ("Automated Monitoring", "Implement systematic tracking of key performance indicators"),
            ("Stakeholder Reporting", "Create executive dashboards for strategic decision support"),
            ("Predictive Modeling", "Leverage historical patterns for forecasting initiatives"),
            ("Process Optimization", "Use data insights to streamline operational workflows"),
        ],
    }
}
