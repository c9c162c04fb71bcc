//! CLI command implementations
//!
//! Commands are organized by concern:
//! - `analyze` - Full pipeline with export
//! - `inspect` - Profile, classify and KPI-only commands
//! - `backend` - Generative backend status
//!
//! Shared here: dataset loading and narrator config layering.

pub mod analyze;
pub mod backend;
pub mod inspect;

// Re-export command functions for main.rs
pub use analyze::*;
pub use backend::*;
pub use inspect::*;

use std::path::Path;

use anyhow::{Context, Result};
use eviden_core::{clean_dataset_columns, load_dataset, BackendKind, Dataset, NarratorConfig};

use crate::cli::BackendArgs;

/// Load a dataset, optionally normalising its column names
pub fn load_input(file: &Path, clean_columns: bool) -> Result<Dataset> {
    let dataset = load_dataset(file)
        .with_context(|| format!("Failed to load dataset: {}", file.display()))?;
    if clean_columns {
        return clean_dataset_columns(dataset).context("Failed to clean column names");
    }
    Ok(dataset)
}

/// Config file (or built-in defaults), then environment, then flags
pub fn narrator_config(path: Option<&Path>, args: &BackendArgs) -> Result<NarratorConfig> {
    let mut config = NarratorConfig::load(path).context("Failed to load narrator config")?;
    apply_env(&mut config, |key| std::env::var(key).ok())?;
    apply_backend_args(&mut config, args)?;
    Ok(config)
}

/// Apply environment overrides, read through `env`
pub fn apply_env<F>(config: &mut NarratorConfig, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(backend) = var("EVIDEN_AI_BACKEND") {
        config.backend = parse_backend(&backend)?;
    }
    if let Some(key) = var("OPENAI_API_KEY") {
        config.api_key = Some(key);
    }
    if let Some(model) = var("OPENAI_MODEL") {
        config.openai_compatible.model = model;
    }
    if let Some(host) = var("OPENAI_COMPATIBLE_HOST") {
        config.openai_compatible.host = host;
    }
    if let Some(host) = var("OLLAMA_HOST") {
        config.ollama.host = host;
    }
    if let Some(model) = var("OLLAMA_MODEL") {
        config.ollama.model = model;
    }
    Ok(())
}

/// Apply command-line overrides; `--model` and `--host` target the active backend
pub fn apply_backend_args(config: &mut NarratorConfig, args: &BackendArgs) -> Result<()> {
    if let Some(ref backend) = args.backend {
        config.backend = parse_backend(backend)?;
    }
    if let Some(ref key) = args.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(ref model) = args.model {
        config.set_model(model.as_str());
    }
    if let Some(ref host) = args.host {
        config.set_host(host.as_str());
    }
    Ok(())
}

fn parse_backend(value: &str) -> Result<BackendKind> {
    value.parse::<BackendKind>().map_err(|e| anyhow::anyhow!(e))
}
