pub mod engine;
pub mod imbalance;
pub mod poi;
pub mod sessions;
pub mod simulator;
pub mod structure;
pub mod swings;
pub mod trend;
