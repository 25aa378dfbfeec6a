pub mod report;
pub mod runner;
pub mod source;

pub use report::BacktestReport;
pub use runner::BacktestRunner;
pub use source::{CandleSource, JsonDirSource, MemorySource};
