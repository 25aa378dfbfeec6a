use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::EngineError;
use crate::models::{Candle, CandleSeries};

/// Supplies the candle series for a symbol.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn load(&self, symbol: &str) -> Result<CandleSeries>;
}

/// Reads `<dir>/<symbol>.json`, a JSON array of candles.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    pub dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.json", symbol))
    }
}

#[async_trait]
impl CandleSource for JsonDirSource {
    async fn load(&self, symbol: &str) -> Result<CandleSeries> {
        let path = self.path_for(symbol);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let candles: Vec<Candle> = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!("Loaded {} candles for {} from {}", candles.len(), symbol, path.display());
        Ok(CandleSeries::new(candles))
    }
}

/// Series held in memory, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    series: HashMap<String, CandleSeries>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, candles: CandleSeries) -> Self {
        self.series.insert(symbol.to_string(), candles);
        self
    }
}

#[async_trait]
impl CandleSource for MemorySource {
    async fn load(&self, symbol: &str) -> Result<CandleSeries> {
        self.series.get(symbol).cloned().ok_or_else(|| {
            anyhow!(EngineError::Source {
                symbol: symbol.to_string(),
                reason: "unknown symbol".to_string(),
            })
        })
    }
}
