//! Greenrank CLI
//!
//! Usage:
//!   cargo run --bin greenrank -- --eval        (evaluate the current prompt on the test set)
//!   cargo run --bin greenrank -- --optimize    (evolve prompts on the training set)

use anyhow::{Context, Result};
use greenrank_core::evolve::{EvolveConfig, Evaluator, Optimizer, SEED_PROMPT};
use greenrank_core::{evaluate_prompt, Config, Dataset};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "greenrank=info,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Configuration loaded");
    info!("  LLM API: {}", config.llm_api_url);
    info!("  Model: {}", config.llm_model);

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--optimize") {
        run_optimization(&config, args.iter().any(|a| a == "--production")).await
    } else {
        run_evaluation(&config).await
    }
}

async fn run_evaluation(config: &Config) -> Result<()> {
    info!("=== Test-set evaluation ===");

    let model = Arc::new(config.chat_client()?);
    let evaluator = Evaluator::new(model);

    let testset = Dataset::load_from_file(&config.test_path)?;
    info!("Test sessions: {}", testset.len());

    let prompt = load_prompt(&config.output_dir);
    info!("Prompt length: {} chars", prompt.len());

    let report = evaluate_prompt(&evaluator, &prompt, &testset.examples, config.concurrency).await;

    std::fs::create_dir_all(&config.output_dir)?;
    let report_path = Path::new(&config.output_dir).join("evaluation.json");
    report.save_to_file(&report_path)?;
    info!("Saved report to {}", report_path.display());

    Ok(())
}

async fn run_optimization(config: &Config, production: bool) -> Result<()> {
    info!("=== Prompt evolution ===");

    let model = Arc::new(config.chat_client()?);

    let trainset = Dataset::load_from_file(&config.train_path)?;
    info!("Training sessions: {}", trainset.len());

    let evolve_config = if production {
        EvolveConfig::production()
    } else {
        EvolveConfig::default()
    }
    .with_seed_prompt(load_prompt(&config.output_dir))
    .with_concurrency(config.concurrency);

    let mut optimizer = Optimizer::new(model, evolve_config, config.seed);
    let result = optimizer.run(&trainset.examples).await;

    for record in &result.history {
        let best = record.beam.first().map(|(_, r)| *r).unwrap_or(0.0);
        info!(
            "  Gen {}: {} failures, pool {}, best reward {:.3}",
            record.generation, record.errors_found, record.pool_size, best
        );
    }

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir))?;
    let output_path = PathBuf::from(&config.output_dir).join("latest.txt");
    std::fs::write(&output_path, &result.best_prompt)?;
    let run_path = PathBuf::from(&config.output_dir).join(format!(
        "run-{}.json",
        result.created_at.format("%Y%m%dT%H%M%S")
    ));
    result.save_to_file(&run_path)?;

    info!("Saved best prompt to {}", output_path.display());
    info!("Saved run history to {}", run_path.display());
    println!("\n=== Optimized Prompt ===\n\n{}", result.best_prompt);

    Ok(())
}

/// Last optimized prompt if one was saved, else the built-in seed.
fn load_prompt(output_dir: &str) -> String {
    let path = Path::new(output_dir).join("latest.txt");
    match std::fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => content,
        _ => SEED_PROMPT.to_string(),
    }
}
