//! Eviden CLI - Automated insight reports for tabular data
//!
//! Usage:
//!   eviden analyze sales.csv        Full pipeline, export to ./reports
//!   eviden profile data.json        Dataset facts and column statistics
//!   eviden classify data.csv        Inferred domain and keyword scores
//!   eviden kpis data.csv            KPIs only
//!   eviden backend                  Check the generative backend

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging on stderr so stdout stays machine-readable
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    match cli.command {
        Commands::Analyze {
            file,
            output,
            author,
            no_ai,
            no_export,
            clean_columns,
            json,
            backend,
        } => {
            let config = commands::narrator_config(cli.config.as_deref(), &backend)?;
            let run = commands::AnalyzeRun {
                output,
                author,
                no_ai,
                no_export,
                clean_columns,
                json,
            };
            commands::cmd_analyze(&file, &config, &run).await
        }
        Commands::Profile {
            file,
            clean_columns,
            json,
        } => commands::cmd_profile(&file, clean_columns, json),
        Commands::Classify {
            file,
            clean_columns,
        } => commands::cmd_classify(&file, clean_columns),
        Commands::Kpis {
            file,
            domain,
            clean_columns,
            json,
        } => commands::cmd_kpis(&file, domain.as_deref(), clean_columns, json),
        Commands::Backend { backend } => {
            let config = commands::narrator_config(cli.config.as_deref(), &backend)?;
            commands::cmd_backend(&config).await
        }
    }
}
