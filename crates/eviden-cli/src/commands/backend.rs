//! Generative backend status command

use anyhow::Result;
use eviden_core::{BackendCapability, NarrativeBackend, NarratorConfig};

/// Show the resolved backend config and check that the backend is reachable
pub async fn cmd_backend(config: &NarratorConfig) -> Result<()> {
    println!("🔍 Narrative backend\n");
    println!("  Backend:     {}", config.backend);
    println!("  Host:        {}", config.host());
    println!("  Model:       {}", config.model());
    println!(
        "  API key:     {}",
        if config.api_key.is_some() { "set" } else { "not set" }
    );
    println!(
        "  Sampling:    temperature {}, max {} tokens",
        config.temperature, config.max_tokens
    );
    println!("  Timeout:     {}s\n", config.timeout.as_secs());

    match BackendCapability::from_config(config) {
        BackendCapability::Configured { client } => {
            print!("Checking {} availability... ", client.host());
            if client.health_check().await {
                println!("✅ Connected");
            } else {
                println!("❌ Failed");
                println!("\n⚠️  Could not reach {}", client.host());
                println!("  Narratives will use the template until the backend is reachable.");
            }
        }
        BackendCapability::Unconfigured { reason } => {
            println!("⚠️  Generative backend unavailable: {}", reason);
            println!("  Narratives will use the template.");
            println!("\nTo enable generative narratives:");
            println!("  export OPENAI_API_KEY=sk-...            (OpenAI-compatible)");
            println!("  export EVIDEN_AI_BACKEND=ollama          (local Ollama)");
        }
    }

    Ok(())
}
