use algoforge::config::ConfigManager;
use algoforge::engines::analysis::{AnalysisOrchestrator, AnalysisRequest, HeuristicTreeSearch};
use algoforge::engines::evaluation::HeuristicBacktest;
use algoforge::oracle::HttpOracle;
use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (request_path, config_path) = match args.as_slice() {
        [request] => (request, None),
        [request, config] => (request, Some(config)),
        _ => bail!("usage: algoforge <request.json> [config.toml]"),
    };

    let manager = ConfigManager::new();
    match config_path {
        Some(path) => manager.load_from_file(path)?,
        None => manager.load_from_env()?,
    }
    let config = manager.get();

    let raw = std::fs::read_to_string(request_path)
        .with_context(|| format!("failed to read {}", request_path))?;
    let request: AnalysisRequest =
        serde_json::from_str(&raw).context("failed to parse analysis request")?;

    let oracle = Arc::new(HttpOracle::from_config(&config.oracle)?);
    let orchestrator = AnalysisOrchestrator::new(
        config,
        oracle,
        Arc::new(HeuristicBacktest),
        Arc::new(HeuristicTreeSearch::default()),
    )?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing current step");
            ctrl_c.cancel();
        }
    });

    let report = orchestrator.analyze(request, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
