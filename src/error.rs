use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("imbalance end not found: search {start}..{end} ran past the {len} available candles")]
    ImbalanceEndNotFound { start: usize, end: usize, len: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("candle series is empty")]
    EmptySeries,

    #[error("candle source failed for {symbol}: {reason}")]
    Source { symbol: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
