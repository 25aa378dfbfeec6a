use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::{CandleSeries, Side};

/// A three-candle gap: the first and last candle ranges do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Imbalance {
    pub first: usize,
    pub middle: usize,
    pub last: usize,
    /// High for a bearish gap (price left downwards), Low for a bullish one.
    pub side: Side,
    pub top: f64,
    pub bottom: f64,
}

impl Imbalance {
    pub fn size(&self) -> f64 {
        self.top - self.bottom
    }
}

/// Gap between `first` and `last`, if any. `middle` is only recorded.
pub fn gap_between(
    candles: &CandleSeries,
    first: usize,
    middle: usize,
    last: usize,
) -> Option<Imbalance> {
    let a = candles.get(first)?;
    let c = candles.get(last)?;

    if a.low > c.high {
        Some(Imbalance {
            first,
            middle,
            last,
            side: Side::High,
            top: a.low,
            bottom: c.high,
        })
    } else if c.low > a.high {
        Some(Imbalance {
            first,
            middle,
            last,
            side: Side::Low,
            top: c.low,
            bottom: a.high,
        })
    } else {
        None
    }
}

/// First imbalance whose first candle is at or after `start` and whose last
/// candle lies before `end`. Candles inside the middle candle are skipped
/// when looking for the third one.
///
/// `end` past the series or an empty window is a caller error, and so is a
/// window reaching the end of the series while the third candle of a
/// pattern is still pending. A window cut short by the caller simply ends.
pub fn find_imbalance(
    candles: &CandleSeries,
    start: usize,
    end: usize,
) -> Result<Option<Imbalance>> {
    if end > candles.len() || start >= end {
        return Err(EngineError::ImbalanceEndNotFound {
            start,
            end,
            len: candles.len(),
        });
    }

    for first in start..end {
        let middle = first + 1;
        if middle >= end {
            break;
        }
        match (middle + 1..end).find(|&j| !candles[j].is_inside(&candles[middle])) {
            Some(last) => {
                if let Some(imb) = gap_between(candles, first, middle, last) {
                    return Ok(Some(imb));
                }
            }
            None if end == candles.len() && middle + 1 < end => {
                return Err(EngineError::ImbalanceEndNotFound {
                    start,
                    end,
                    len: candles.len(),
                });
            }
            None => {}
        }
    }
    Ok(None)
}

/// Fair value gap ending at `last`: the three candles `last-2..=last` form a
/// gap and all of them close in the gap's direction.
pub fn fair_value_gap(candles: &CandleSeries, last: usize) -> Option<Imbalance> {
    let first = last.checked_sub(2)?;
    let imb = gap_between(candles, first, first + 1, last)?;
    let aligned = (first..=last).all(|k| match imb.side {
        Side::High => candles[k].is_bearish(),
        Side::Low => candles[k].is_bullish(),
    });
    aligned.then_some(imb)
}
