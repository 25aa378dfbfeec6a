use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::report::BacktestReport;
use super::source::CandleSource;
use crate::config::EngineConfig;
use crate::core::engine::Engine;
use crate::error::{EngineError, Result};

/// Runs one engine per symbol. Loading is async; the engine pass itself runs
/// on the blocking pool.
pub struct BacktestRunner {
    pub source: Arc<dyn CandleSource>,
    engine: Engine,
}

impl BacktestRunner {
    pub fn new(source: Arc<dyn CandleSource>, config: EngineConfig) -> Result<Self> {
        Ok(Self {
            source,
            engine: Engine::new(config)?,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    /// Reports for every symbol that loaded and analyzed, sorted by symbol.
    /// Failures are logged and skipped.
    pub async fn run(&self, symbols: &[String]) -> Vec<BacktestReport> {
        info!("=== BACKTEST START: {} symbols ===", symbols.len());

        let mut set = JoinSet::new();
        for symbol in symbols {
            let source = Arc::clone(&self.source);
            let engine = self.engine.clone();
            let symbol = symbol.clone();
            set.spawn(async move {
                let result = run_symbol(source, engine, symbol.clone()).await;
                (symbol, result)
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((symbol, Ok(report))) => {
                    info!(
                        "  {}: {} candles, {} trades, PnL {:+.2}",
                        symbol, report.candles, report.total_trades, report.total_pnl
                    );
                    reports.push(report);
                }
                Ok((symbol, Err(e))) => warn!("Skipping {}: {}", symbol, e),
                Err(e) => warn!("Backtest task failed: {}", e),
            }
        }

        reports.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        info!("=== BACKTEST DONE: {} reports ===", reports.len());
        reports
    }
}

async fn run_symbol(
    source: Arc<dyn CandleSource>,
    engine: Engine,
    symbol: String,
) -> Result<BacktestReport> {
    let candles = source
        .load(&symbol)
        .await
        .map_err(|e| EngineError::Source {
            symbol: symbol.clone(),
            reason: format!("{:#}", e),
        })?;

    let name = symbol.clone();
    tokio::task::spawn_blocking(move || -> Result<BacktestReport> {
        let analysis = engine.analyze(&candles)?;
        Ok(BacktestReport::from_analysis(&name, &candles, &analysis))
    })
    .await
    .map_err(|e| EngineError::Source {
        symbol,
        reason: format!("engine task failed: {}", e),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtesting::source::MemorySource;
    use crate::models::CandleSeries;
    use crate::test_helpers::{default_test_config, make_bullish_structure, make_choch_structure};

    #[tokio::test]
    async fn reports_are_sorted_and_failures_skipped() {
        let source = MemorySource::new()
            .with("ZED", make_choch_structure())
            .with("ABC", make_bullish_structure())
            .with("EMPTY", CandleSeries::default());
        let runner = BacktestRunner::new(Arc::new(source), default_test_config()).unwrap();

        let symbols: Vec<String> = ["ZED", "MISSING", "ABC", "EMPTY"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let reports = runner.run(&symbols).await;

        let names: Vec<&str> = reports.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(names, vec!["ABC", "ZED"]);
        assert_eq!(reports[0].candles, 13);
        assert_eq!(reports[1].confirmed_breaks, 2);
    }

    #[test]
    fn runner_validates_config() {
        let cfg = EngineConfig {
            risk_budget: 0.0,
            ..Default::default()
        };
        let result = BacktestRunner::new(Arc::new(MemorySource::new()), cfg);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }
}
