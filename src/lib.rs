pub mod backtesting;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
#[cfg(test)]
pub mod test_helpers;

pub use crate::core::engine::{Analysis, Annotations, Engine};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
