//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Eviden - Automated insight reports for any tabular dataset
#[derive(Parser)]
#[command(name = "eviden")]
#[command(about = "Automated insight reports for tabular data", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Narrator config file (TOML)
    ///
    /// Defaults to ~/.local/share/eviden/config/narrator.toml when present,
    /// otherwise the built-in configuration.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Generative backend overrides (take precedence over env and config)
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Backend: openai_compatible, ollama, mock
    #[arg(long)]
    pub backend: Option<String>,

    /// API key for OpenAI-compatible servers
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model name for the active backend
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the active backend
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and export an insight report
    Analyze {
        /// Dataset file (CSV or JSON)
        file: PathBuf,

        /// Output directory for exported files
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,

        /// Report author
        #[arg(long, default_value = "Eviden")]
        author: String,

        /// Skip the generative backend and use the template narrative
        #[arg(long)]
        no_ai: bool,

        /// Print results without writing any files
        #[arg(long)]
        no_export: bool,

        /// Normalise column names before analysis
        #[arg(long)]
        clean_columns: bool,

        /// Print the bundle as JSON instead of a summary
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Show dataset facts, missing values and column statistics
    Profile {
        /// Dataset file (CSV or JSON)
        file: PathBuf,

        /// Normalise column names before profiling
        #[arg(long)]
        clean_columns: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the inferred domain and per-domain keyword scores
    Classify {
        /// Dataset file (CSV or JSON)
        file: PathBuf,

        /// Normalise column names before classifying
        #[arg(long)]
        clean_columns: bool,
    },

    /// Compute KPIs without generating a narrative
    Kpis {
        /// Dataset file (CSV or JSON)
        file: PathBuf,

        /// Domain to extract for: sales, finance, customer, general (inferred if omitted)
        #[arg(short, long)]
        domain: Option<String>,

        /// Normalise column names before extraction
        #[arg(long)]
        clean_columns: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the configured generative backend and check that it is reachable
    Backend {
        #[command(flatten)]
        backend: BackendArgs,
    },
}
