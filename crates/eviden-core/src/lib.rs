//! Eviden Core Library
//!
//! Turns a tabular dataset of unknown schema into an insight bundle:
//! - Dataset loading with semantic type inference (CSV, JSON)
//! - Keyword-based column resolution and domain classification
//! - Dataset profiling (facts, missing values, column statistics)
//! - Domain-specific KPI extraction with deterministic formatting
//! - Narrative synthesis via a pluggable generative backend, with a
//!   deterministic template fallback
//! - Bundle export (JSON, report metadata, markdown)

pub mod ai;
pub mod bundle;
pub mod classify;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod format;
pub mod import;
pub mod kpi;
pub mod narrative;
pub mod pipeline;
pub mod profile;
pub mod prompts;
pub mod resolve;

/// Test utilities including a mock chat-completions server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIClient, BackendKind, CompletionRequest, MockBackend, NarrativeBackend};
pub use bundle::InsightBundle;
pub use classify::{classify, DomainLabel};
pub use config::NarratorConfig;
pub use dataset::{Column, Dataset, SemanticType, Value};
pub use error::{Error, Result};
pub use export::{render_markdown, write_report, ExportPaths, ReportMetadata};
pub use import::{clean_dataset_columns, load_dataset};
pub use kpi::{KpiEntry, KpiExtractor, KpiList};
pub use narrative::{
    BackendCapability, NarrativeInput, NarrativeMethod, NarrativeResult, NarrativeSynthesizer,
};
pub use pipeline::{analyze, analyze_with, AnalyzeOptions};
pub use profile::{DataQuality, MissingValueReport, Profile, Profiler};
pub use prompts::{Prompt, PromptId, PromptLibrary};
