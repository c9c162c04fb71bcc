//! Integration tests for eviden-core
//!
//! These tests exercise the full load → profile → classify → extract →
//! narrate → export workflow.

use std::time::Duration;

use eviden_core::{
    ai::BackendKind,
    analyze, analyze_with,
    import::parse_csv,
    narrative::FALLBACK_BACKEND,
    test_utils::{MockChatServer, MockReply},
    AnalyzeOptions, BackendCapability, DomainLabel, NarrativeMethod, NarrativeSynthesizer,
    NarratorConfig, PromptLibrary,
};

const SECTIONS: [&str; 4] = [
    "## EXECUTIVE SUMMARY",
    "## KEY FINDINGS",
    "## ACTIONABLE RECOMMENDATIONS",
    "## RISKS & LIMITATIONS",
];

fn sales_csv() -> &'static str {
    "order_date,product,quantity,revenue\n\
     2024-01-01,Widget,2,100\n\
     2024-01-05,Gadget,1,200\n\
     2024-01-11,Widget,3,300\n"
}

fn customer_csv() -> &'static str {
    "customer_id,age,segment,churn,lifetime_value\n\
     C1,34,Gold,Yes,1200\n\
     C2,45,Silver,No,800\n\
     C3,29,Gold,No,950\n\
     C4,52,Bronze,Yes,400\n"
}

fn finance_csv() -> &'static str {
    "account_id,transaction_type,debit,credit,balance\n\
     A1,transfer,50,0,1000\n\
     A2,deposit,0,300,1300\n\
     A1,transfer,25,0,975\n"
}

fn offline() -> NarrativeSynthesizer {
    NarrativeSynthesizer::new(&NarratorConfig::default())
}

fn openai_config(server: &MockChatServer) -> NarratorConfig {
    let mut config = NarratorConfig {
        api_key: Some("sk-test".into()),
        ..NarratorConfig::default()
    };
    config.set_host(server.url());
    config
}

// =============================================================================
// Offline pipeline
// =============================================================================

#[tokio::test]
async fn test_sales_pipeline_offline() {
    let dataset = parse_csv(sales_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &offline()).await.unwrap();

    assert_eq!(bundle.domain(), DomainLabel::Sales);
    assert_eq!(bundle.facts().rows, 3);

    let kpis = bundle.kpis();
    assert_eq!(kpis.get("Total Revenue"), Some("$600.00"));
    assert_eq!(kpis.get("Average Order Value"), Some("$200.00"));
    assert_eq!(kpis.get("Total Units Sold"), Some("6"));
    assert_eq!(kpis.get("Unique Products"), Some("2"));
    assert_eq!(kpis.get("Top Product"), Some("Widget (2 sales)"));
    assert_eq!(kpis.get("Data Period"), Some("10 days"));
    assert_eq!(kpis.last().unwrap().value, "Sales");

    let narrative = bundle.narrative();
    assert_eq!(narrative.method, NarrativeMethod::Fallback);
    assert_eq!(narrative.backend, FALLBACK_BACKEND);
    assert!(!narrative.backend_available);
    for section in SECTIONS {
        assert!(narrative.text.contains(section));
    }
    assert!(narrative.text.contains("This sales dataset comprises 3 records across 4 features"));
}

#[tokio::test]
async fn test_customer_churn_rates() {
    let dataset = parse_csv(customer_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &offline()).await.unwrap();

    assert_eq!(bundle.domain(), DomainLabel::Customer);
    let kpis = bundle.kpis();
    assert_eq!(kpis.get("Total Customers"), Some("4"));
    assert_eq!(kpis.get("Churn Rate"), Some("50.00%"));
    assert_eq!(kpis.get("Retention Rate"), Some("50.00%"));
    assert_eq!(kpis.get("Largest Segment"), Some("Gold (50.0%)"));
    assert_eq!(kpis.get("Dataset Type"), Some("Customer"));
}

#[tokio::test]
async fn test_finance_net_position() {
    let dataset = parse_csv(finance_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &offline()).await.unwrap();

    assert_eq!(bundle.domain(), DomainLabel::Finance);
    let kpis = bundle.kpis();
    assert_eq!(kpis.get("Total Debits"), Some("$75.00"));
    assert_eq!(kpis.get("Total Credits"), Some("$300.00"));
    assert_eq!(kpis.get("Net Position"), Some("$225.00"));
    assert_eq!(kpis.get("Total Accounts"), Some("2"));
    assert_eq!(kpis.get("Most Common Transaction"), Some("transfer"));
}

#[tokio::test]
async fn test_unknown_schema_is_general() {
    let dataset = parse_csv("alpha,beta\n1,x\n3,y\n,z\n".as_bytes()).unwrap();
    let bundle = analyze(&dataset, &offline()).await.unwrap();

    assert_eq!(bundle.domain(), DomainLabel::General);
    assert_eq!(bundle.kpis().get("Total Records"), Some("3"));
    assert_eq!(bundle.kpis().get("Highest Avg (alpha)"), Some("2.00"));
    assert_eq!(bundle.missing().total_missing, 1);
    assert!(bundle.narrative().text.contains("**Data Quality**: 1 missing values"));
}

// =============================================================================
// Generative backends over HTTP
// =============================================================================

#[tokio::test]
async fn test_openai_generative_narrative() {
    let server = MockChatServer::start_with(MockReply::Text(
        "## EXECUTIVE SUMMARY\n\nRevenue is concentrated in Widgets.\n".into(),
    ))
    .await;
    let synth = NarrativeSynthesizer::new(&openai_config(&server))
        .with_prompts(PromptLibrary::embedded_only());

    let dataset = parse_csv(sales_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &synth).await.unwrap();

    let narrative = bundle.narrative();
    assert_eq!(narrative.method, NarrativeMethod::Generative);
    assert_eq!(narrative.backend, "gpt-4-turbo-preview");
    assert!(narrative.text.contains("concentrated in Widgets"));
    assert_eq!(server.requests(), 1);

    let prompt = server.last_prompt().unwrap();
    assert!(prompt.contains("- Type: Sales"));
    assert!(prompt.contains("- Total Revenue: $600.00"));
    assert!(prompt.contains("- Dataset Type: Sales"));
}

#[tokio::test]
async fn test_backend_error_falls_back_once() {
    let server = MockChatServer::start_with(MockReply::Status(503)).await;
    let synth = NarrativeSynthesizer::new(&openai_config(&server))
        .with_prompts(PromptLibrary::embedded_only());

    let dataset = parse_csv(sales_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &synth).await.unwrap();

    assert_eq!(bundle.narrative().method, NarrativeMethod::Fallback);
    assert!(bundle.narrative().backend_available);
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn test_backend_timeout_falls_back_once() {
    let server = MockChatServer::start_with(MockReply::Delayed(Duration::from_secs(3))).await;
    let config = NarratorConfig {
        timeout: Duration::from_secs(1),
        ..openai_config(&server)
    };
    let synth = NarrativeSynthesizer::new(&config).with_prompts(PromptLibrary::embedded_only());

    let dataset = parse_csv(sales_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &synth).await.unwrap();

    let narrative = bundle.narrative();
    assert_eq!(narrative.method, NarrativeMethod::Fallback);
    assert_eq!(narrative.backend, FALLBACK_BACKEND);
    assert!(narrative.backend_available);
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn test_empty_completion_falls_back() {
    let server = MockChatServer::start_with(MockReply::Empty).await;
    let synth = NarrativeSynthesizer::new(&openai_config(&server))
        .with_prompts(PromptLibrary::embedded_only());

    let dataset = parse_csv(sales_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &synth).await.unwrap();

    assert_eq!(bundle.narrative().method, NarrativeMethod::Fallback);
    assert!(bundle.narrative().text.contains("## RISKS & LIMITATIONS"));
}

#[tokio::test]
async fn test_ollama_generative_narrative() {
    let server = MockChatServer::start().await;
    let mut config = NarratorConfig {
        backend: BackendKind::Ollama,
        ..NarratorConfig::default()
    };
    config.set_host(server.url());
    let synth = NarrativeSynthesizer::new(&config).with_prompts(PromptLibrary::embedded_only());

    let dataset = parse_csv(customer_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &synth).await.unwrap();

    assert_eq!(bundle.narrative().method, NarrativeMethod::Generative);
    assert_eq!(bundle.narrative().backend, "llama3.2");
    assert!(server.last_prompt().unwrap().contains("- Churn Rate: 50.00%"));
}

#[tokio::test]
async fn test_force_fallback_makes_no_request() {
    let server = MockChatServer::start().await;
    let synth = NarrativeSynthesizer::new(&openai_config(&server));
    assert!(matches!(synth.capability(), BackendCapability::Configured { .. }));

    let dataset = parse_csv(sales_csv().as_bytes()).unwrap();
    let bundle = analyze_with(&dataset, &synth, AnalyzeOptions { force_fallback: true })
        .await
        .unwrap();

    assert_eq!(bundle.narrative().method, NarrativeMethod::Fallback);
    assert_eq!(server.requests(), 0);
}

// =============================================================================
// Export
// =============================================================================

#[tokio::test]
async fn test_export_workflow() {
    let dataset = parse_csv(finance_csv().as_bytes()).unwrap();
    let bundle = analyze(&dataset, &offline()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let paths = eviden_core::write_report(&bundle, "Finance Team", dir.path()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.bundle).unwrap()).unwrap();
    assert_eq!(json["domain"], "finance");
    assert_eq!(json["facts"]["rows"], 3);
    assert_eq!(json["narrative"]["backend"], "rule-based");

    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.metadata).unwrap()).unwrap();
    assert_eq!(metadata["author"], "Finance Team");
    assert_eq!(metadata["generative_used"], false);
    assert_eq!(metadata["record_count"], 3);

    let report = std::fs::read_to_string(&paths.report).unwrap();
    assert!(report.starts_with("# Finance Insight Report"));
    assert!(report.contains("| Net Position | $225.00 |"));
}
