pub mod candle;
pub mod direction;

pub use candle::{Candle, CandleSeries};
pub use direction::*;
