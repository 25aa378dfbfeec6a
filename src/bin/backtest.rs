use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use smc_structure::backtesting::{BacktestRunner, JsonDirSource};
use smc_structure::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let enabled: Vec<String> = cfg
        .engine
        .enabled_types()
        .iter()
        .map(|t| t.to_string())
        .collect();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║          SMART-MONEY STRUCTURE — BACKTESTER              ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!("  Data dir:    {}", cfg.data_dir);
    println!("  Symbols:     {}", cfg.symbols.join(", "));
    let types = if enabled.is_empty() {
        "none".to_string()
    } else {
        enabled.join(", ")
    };
    println!("  POI types:   {}", types);
    println!("  Min RR:      {:.2}", cfg.engine.min_rr);
    println!("  Risk budget: {:.2}", cfg.engine.risk_budget);
    println!();

    let source = Arc::new(JsonDirSource::new(&cfg.data_dir));
    let runner = BacktestRunner::new(source, cfg.engine.clone())?;
    let reports = runner.run(&cfg.symbols).await;

    if reports.is_empty() {
        println!("ERROR: No symbol produced a report.");
        println!("Expected candle files like {}/<SYMBOL>.json", cfg.data_dir);
        return Ok(());
    }

    for report in &reports {
        report.print_summary();
    }

    let report_file = format!("{}/backtest_report.json", cfg.data_dir);
    let json = serde_json::to_string_pretty(&reports)?;
    tokio::fs::write(&report_file, json)
        .await
        .with_context(|| format!("writing {}", report_file))?;
    println!("\nReport saved to: {}", report_file);

    Ok(())
}
